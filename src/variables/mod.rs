//! Variable descriptor model.
//!
//! - `descriptor`: the descriptor type, its flag set and invariants
//! - `builtins`: the immutable table of runtime-provided variables

pub mod builtins;
pub mod descriptor;
