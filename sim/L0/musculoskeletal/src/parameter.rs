//! Per-muscle physiological parameter access.
//!
//! Get and set recognize the same parameters. At present only the optimal
//! fiber length is exposed; every other kind fails with
//! [`MusculoskeletalError::UnimplementedParameter`] on both paths without
//! touching the model.

use std::fmt;

use sim_core::MusculoskeletalEngine;
use sim_muscle::MuscleCharacteristics;
use tracing::debug;

use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A physiological muscle parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MuscleParameter {
    /// Optimal fiber length (m).
    OptimalLength,
    /// Maximum isometric force (N).
    MaxIsometricForce,
    /// Tendon slack length (m).
    TendonSlackLength,
    /// Pennation angle (radians).
    PennationAngle,
    /// Maximum shortening velocity (optimal lengths per second).
    MaxShorteningVelocity,
}

impl MuscleParameter {
    /// Every parameter kind.
    pub const ALL: [Self; 5] = [
        Self::OptimalLength,
        Self::MaxIsometricForce,
        Self::TendonSlackLength,
        Self::PennationAngle,
        Self::MaxShorteningVelocity,
    ];

    /// Mutable access to the field this parameter names.
    ///
    /// Resolved before the engine hands out its characteristics, so an
    /// unsupported kind never reaches engine state.
    fn slot(self) -> Result<fn(&mut MuscleCharacteristics) -> &mut f64> {
        match self {
            Self::OptimalLength => Ok(optimal_length_mut),
            Self::MaxIsometricForce
            | Self::TendonSlackLength
            | Self::PennationAngle
            | Self::MaxShorteningVelocity => {
                Err(MusculoskeletalError::UnimplementedParameter { parameter: self })
            }
        }
    }
}

fn optimal_length_mut(characteristics: &mut MuscleCharacteristics) -> &mut f64 {
    &mut characteristics.optimal_length
}

impl fmt::Display for MuscleParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OptimalLength => "optimal_length",
            Self::MaxIsometricForce => "max_isometric_force",
            Self::TendonSlackLength => "tendon_slack_length",
            Self::PennationAngle => "pennation_angle",
            Self::MaxShorteningVelocity => "max_shortening_velocity",
        };
        f.write_str(name)
    }
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Read a muscle parameter.
    pub fn get_muscle_parameter(&self, index: usize, parameter: MuscleParameter) -> Result<f64> {
        let characteristics = &self.engine().muscle(index)?.characteristics;
        match parameter {
            MuscleParameter::OptimalLength => Ok(characteristics.optimal_length),
            MuscleParameter::MaxIsometricForce
            | MuscleParameter::TendonSlackLength
            | MuscleParameter::PennationAngle
            | MuscleParameter::MaxShorteningVelocity => {
                Err(MusculoskeletalError::UnimplementedParameter { parameter })
            }
        }
    }

    /// Write a muscle parameter. Takes effect for every later query.
    ///
    /// The value must be finite and positive.
    pub fn set_muscle_parameter(
        &mut self,
        index: usize,
        parameter: MuscleParameter,
        value: f64,
    ) -> Result<()> {
        self.engine().muscle(index)?;
        let slot = parameter.slot()?;
        if !value.is_finite() || value <= 0.0 {
            return Err(MusculoskeletalError::InvalidParameterValue { parameter, value });
        }
        *slot(self.engine_mut().characteristics_mut(index)?) = value;
        debug!(index, %parameter, value, "muscle parameter set");
        Ok(())
    }
}
