//! Error types for scalar evaluation.

use thiserror::Error;

/// Errors raised while evaluating expressions or assembling samples.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymbolicError {
    /// The expression depends on a variable that has no bound value.
    #[error("free variable '{name}' has no bound value")]
    FreeVariable {
        /// Name of the unbound variable.
        name: String,
    },

    /// A row-major batch has rows of different lengths.
    #[error("row {row} has {actual} entries, expected {expected}")]
    RaggedRows {
        /// Index of the first short or long row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
}

impl SymbolicError {
    /// Create a free variable error.
    pub fn free_variable(name: impl Into<String>) -> Self {
        Self::FreeVariable { name: name.into() }
    }
}

/// Result type for scalar operations.
pub type Result<T> = std::result::Result<T, SymbolicError>;
