//! Error types for musculoskeletal operations.

use sim_core::EngineError;
use sim_muscle::MuscleKind;
use sim_types::{Representation, SymbolicError};
use thiserror::Error;

use crate::parameter::MuscleParameter;

/// Errors raised by model queries, dynamics and integration.
///
/// Every error aborts the enclosing batch or trajectory; no partial results
/// are returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MusculoskeletalError {
    /// Inputs mix numeric and symbolic representations, or a symbolic input
    /// was given to a numeric model.
    #[error("{what} is {actual} but {expected} was required")]
    TypeMismatch {
        /// The offending input.
        what: &'static str,
        /// Representation the call required.
        expected: Representation,
        /// Representation supplied.
        actual: Representation,
    },

    /// An input has the wrong leading dimension (or shape) for its role.
    #[error("{what} has {actual} entries, expected {expected}")]
    DimensionMismatch {
        /// The offending input.
        what: &'static str,
        /// Required size.
        expected: usize,
        /// Supplied size.
        actual: usize,
    },

    /// Control kind name not recognized.
    #[error("control type '{name}' is not supported")]
    UnsupportedControlType {
        /// The unrecognized name.
        name: String,
    },

    /// Integration method name not recognized.
    #[error("integration method '{name}' is not supported")]
    UnsupportedIntegrationMethod {
        /// The unrecognized name.
        name: String,
    },

    /// The muscle's declared type has no force-curve evaluator.
    #[error("muscle {index} has unsupported type {kind}")]
    UnsupportedMuscleType {
        /// Muscle index.
        index: usize,
        /// Declared type.
        kind: MuscleKind,
    },

    /// The parameter kind is not accessible.
    #[error("muscle parameter {parameter} is not implemented")]
    UnimplementedParameter {
        /// The requested parameter.
        parameter: MuscleParameter,
    },

    /// The value cannot be assigned to the parameter.
    #[error("invalid value {value} for muscle parameter {parameter}")]
    InvalidParameterValue {
        /// The parameter being set.
        parameter: MuscleParameter,
        /// The rejected value.
        value: f64,
    },

    /// Muscle index or selection beyond the muscle count.
    #[error("muscle index {index} out of range for {count} muscles")]
    MuscleIndexOutOfRange {
        /// First offending index.
        index: usize,
        /// Number of muscles in the model.
        count: usize,
    },

    /// Sample times are empty, non-finite or not strictly increasing.
    #[error("invalid time samples: {reason}")]
    InvalidTimeSamples {
        /// What is wrong with the samples.
        reason: String,
    },

    /// The solver used up its step budget.
    #[error("step limit of {max_steps} exceeded at t = {t}")]
    StepLimitExceeded {
        /// Configured budget.
        max_steps: usize,
        /// Time reached.
        t: f64,
    },

    /// The adaptive step fell below the resolvable minimum.
    #[error("step size {step} underflowed at t = {t}")]
    StepSizeUnderflow {
        /// Time reached.
        t: f64,
        /// Rejected step size.
        step: f64,
    },

    /// The state became non-finite.
    #[error("integration diverged at t = {t}")]
    Diverged {
        /// Time at which a non-finite state appeared.
        t: f64,
    },

    /// Invalid integrator or model configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Error from the underlying engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A symbolic value could not be evaluated.
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
}

impl MusculoskeletalError {
    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid time samples error.
    #[must_use]
    pub fn invalid_time_samples(reason: impl Into<String>) -> Self {
        Self::InvalidTimeSamples {
            reason: reason.into(),
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

    /// Whether this is a dimension error, raised here or by the engine.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::Engine(EngineError::DimensionMismatch { .. })
        )
    }

    /// Check if this is a divergence error.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }
}

/// Result type for musculoskeletal operations.
pub type Result<T> = std::result::Result<T, MusculoskeletalError>;
