//! Identifier registry and the state that accompanies name resolution.
//!
//! - `config`: case folding and overload options
//! - `constants`: CSV keyword tables usable as array indices
//! - `context`: the explicit parse context (file, line, label scope)
//! - `identifiers`: the namespace itself

pub mod config;
pub mod constants;
pub mod context;
pub mod identifiers;

#[cfg(test)]
mod tests;
