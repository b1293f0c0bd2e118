//! Error types and diagnostics for the script front end.
//!
//! This module defines the error types returned by every parsing operation.
//! It includes:
//!
//! - Error structures with source position information
//! - A classification of errors (syntax, unresolved identifier, definition
//!   conflict, unsupported syntax, engine defect)
//! - A diagnostics collector for warnings that do not abort parsing

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
