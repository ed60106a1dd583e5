//! Error types for engine operations.

use sim_types::SymbolicError;
use thiserror::Error;

/// Errors raised by a musculoskeletal engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A vector has the wrong length for its role.
    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        /// The role of the vector (e.g. "pose", "torque").
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Muscle index beyond the muscle count.
    #[error("muscle index {index} out of range for {count} muscles")]
    MuscleIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of muscles in the model.
        count: usize,
    },

    /// Muscle velocity requested from a kinematic update made without
    /// joint velocities.
    #[error("muscle {index} velocity requested but kinematics were updated without velocity")]
    VelocityRequired {
        /// The muscle queried.
        index: usize,
    },

    /// The mass matrix is not positive definite.
    #[error("mass matrix is not positive definite")]
    SingularMassMatrix,

    /// Invalid engine configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A symbolic value could not be evaluated.
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

impl EngineError {
    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Fail unless `actual == expected`.
    pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension(what, expected, actual))
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::dimension("torque", 3, 4);
        assert_eq!(err.to_string(), "torque has length 4, expected 3");

        let err = EngineError::MuscleIndexOutOfRange { index: 7, count: 5 };
        assert!(err.to_string().contains('7'));

        let err: EngineError = SymbolicError::free_variable("q_0").into();
        assert!(err.to_string().contains("q_0"));
    }

    #[test]
    fn test_check_len() {
        assert!(EngineError::check_len("pose", 2, 2).is_ok());
        assert_eq!(
            EngineError::check_len("pose", 2, 3),
            Err(EngineError::dimension("pose", 2, 3))
        );
        assert!(EngineError::invalid_config("x").is_config_error());
    }
}
