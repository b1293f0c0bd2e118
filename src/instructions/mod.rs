//! Instruction dispatch.
//!
//! - `flags`: behaviour bits of an instruction
//! - `shapes`: argument shape selectors
//! - `functions`: builtin expression functions with their signatures
//! - `registry`: the immutable name to descriptor table and block-match table
//! - `arguments`: reads an instruction's argument text according to its shape

pub mod arguments;
pub mod flags;
pub mod functions;
pub mod registry;
pub mod shapes;

#[cfg(test)]
mod tests;
