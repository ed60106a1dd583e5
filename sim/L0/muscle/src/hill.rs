//! Hill-type muscle model.
//!
//! A muscle is described by its declared [`MuscleKind`], its physiological
//! [`MuscleCharacteristics`] and the [`ForceCurves`] matching that kind.
//! Force queries are made against a [`MuscleForce`] evaluator bound to the
//! current [`FiberKinematics`]:
//!
//! ```text
//!   F = F_max * (a * FlCE(l̃, a) * FvCE(ṽ) + FlPE(l̃)) * cos(α)
//! ```
//!
//! The tendon is rigid, so fiber kinematics follow directly from the
//! musculotendon length and velocity:
//!
//! ```text
//!   l_fiber = (L_mt - L_slack) / cos(α)
//!   v_fiber = v_mt / cos(α)
//! ```
//!
//! # Usage
//!
//! ```
//! use sim_muscle::{ActivationState, FiberKinematics, ForceCurves, MuscleCharacteristics, MuscleForce, MuscleKind};
//!
//! let characteristics = MuscleCharacteristics::biceps();
//! let curves = ForceCurves::for_kind(MuscleKind::HillThelen);
//! let mt_length = characteristics.tendon_slack_length + characteristics.optimal_length;
//! let fiber = FiberKinematics::from_musculotendon(&characteristics, mt_length, Some(0.0));
//!
//! let muscle = MuscleForce::new(&curves, &characteristics, &fiber);
//! let force = muscle.force(&ActivationState::from_excitation(1.0));
//! assert!((force - characteristics.max_isometric_force).abs() < 1e-6);
//! ```
//!
//! # References
//!
//! - Zajac, F.E. (1989). Muscle and tendon: properties, models, scaling.
//! - Thelen, D.G. (2003). Adjustment of muscle mechanics model parameters.
//! - De Groote, F. et al. (2016). Evaluation of direct collocation optimal
//!   control problem formulations.

use std::fmt;

use sim_types::Evaluable;

use crate::activation::ActivationState;
use crate::curves::{DeGrooteCurves, HillCurves, ThelenCurves};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The declared type of a muscle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MuscleKind {
    /// Force proportional to activation, no length or velocity dependence.
    IdealizedActuator,
    /// Generic Hill model.
    Hill,
    /// Hill model with Thelen (2003) curves.
    HillThelen,
    /// Thelen curves without the passive element.
    HillThelenActiveOnly,
    /// Hill model with De Groote (2016) smooth curves.
    HillDeGroote,
}

impl MuscleKind {
    /// Every declared kind.
    pub const ALL: [Self; 5] = [
        Self::IdealizedActuator,
        Self::Hill,
        Self::HillThelen,
        Self::HillThelenActiveOnly,
        Self::HillDeGroote,
    ];

    /// Type name as reported by the engine.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::IdealizedActuator => "IdealizedActuator",
            Self::Hill => "Hill",
            Self::HillThelen => "HillThelen",
            Self::HillThelenActiveOnly => "HillThelenActiveOnly",
            Self::HillDeGroote => "HillDeGroote",
        }
    }
}

impl fmt::Display for MuscleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physiological parameters of a muscle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuscleCharacteristics {
    /// Maximum isometric force the muscle can produce (N).
    pub max_isometric_force: f64,

    /// Optimal fiber length where maximum force is generated (m).
    pub optimal_length: f64,

    /// Tendon slack length (m).
    pub tendon_slack_length: f64,

    /// Pennation angle between fibers and the line of action (radians).
    pub pennation_angle: f64,

    /// Maximum shortening velocity (optimal lengths per second).
    pub max_shortening_velocity: f64,
}

impl Default for MuscleCharacteristics {
    fn default() -> Self {
        Self {
            max_isometric_force: 1000.0,
            optimal_length: 0.10,
            tendon_slack_length: 0.20,
            pennation_angle: 0.0,
            max_shortening_velocity: 10.0,
        }
    }
}

impl MuscleCharacteristics {
    /// Biceps-like muscle.
    #[must_use]
    pub fn biceps() -> Self {
        Self {
            max_isometric_force: 700.0,
            optimal_length: 0.116,
            tendon_slack_length: 0.272,
            pennation_angle: 0.0,
            max_shortening_velocity: 10.0,
        }
    }

    /// Triceps-like muscle.
    #[must_use]
    pub fn triceps() -> Self {
        Self {
            max_isometric_force: 800.0,
            optimal_length: 0.134,
            tendon_slack_length: 0.143,
            pennation_angle: 0.209, // ~12 degrees
            max_shortening_velocity: 10.0,
        }
    }

    /// Set the maximum isometric force.
    #[must_use]
    pub fn with_max_isometric_force(mut self, force: f64) -> Self {
        self.max_isometric_force = force;
        self
    }

    /// Set the optimal fiber length.
    #[must_use]
    pub fn with_optimal_length(mut self, length: f64) -> Self {
        self.optimal_length = length;
        self
    }

    /// Set the tendon slack length.
    #[must_use]
    pub fn with_tendon_slack_length(mut self, length: f64) -> Self {
        self.tendon_slack_length = length;
        self
    }

    /// Set the pennation angle.
    #[must_use]
    pub fn with_pennation_angle(mut self, angle: f64) -> Self {
        self.pennation_angle = angle;
        self
    }

    /// Set the maximum shortening velocity.
    #[must_use]
    pub fn with_max_shortening_velocity(mut self, velocity: f64) -> Self {
        self.max_shortening_velocity = velocity;
        self
    }

    /// Musculotendon length with fibers at optimal length.
    #[must_use]
    pub fn optimal_musculotendon_length(&self) -> f64 {
        self.tendon_slack_length + self.optimal_length * self.pennation_angle.cos()
    }

    /// Whether every parameter is finite and physically meaningful.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let positive = |x: f64| x.is_finite() && x > 0.0;
        positive(self.max_isometric_force)
            && positive(self.optimal_length)
            && positive(self.max_shortening_velocity)
            && self.tendon_slack_length.is_finite()
            && self.tendon_slack_length >= 0.0
            && (0.0..std::f64::consts::FRAC_PI_2).contains(&self.pennation_angle)
    }
}

/// Fiber length and, when known, fiber velocity.
///
/// Negative velocity is shortening.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberKinematics<S = f64> {
    /// Fiber length (m).
    pub length: S,
    /// Fiber velocity (m/s), absent when no joint velocity was supplied.
    pub velocity: Option<S>,
}

impl<S: Evaluable> FiberKinematics<S> {
    /// Fiber kinematics for a rigid tendon.
    #[must_use]
    pub fn from_musculotendon(
        characteristics: &MuscleCharacteristics,
        mt_length: S,
        mt_velocity: Option<S>,
    ) -> Self {
        let inv_cos = 1.0 / characteristics.pennation_angle.cos();
        Self {
            length: (mt_length - S::constant(characteristics.tendon_slack_length)).scale(inv_cos),
            velocity: mt_velocity.map(|v| v.scale(inv_cos)),
        }
    }

    /// `length / optimal_length`.
    #[must_use]
    pub fn normalized_length(&self, characteristics: &MuscleCharacteristics) -> S {
        self.length.scale(1.0 / characteristics.optimal_length)
    }

    /// `velocity / (optimal_length * max_shortening_velocity)`.
    #[must_use]
    pub fn normalized_velocity(&self, characteristics: &MuscleCharacteristics) -> Option<S> {
        let scale = characteristics.optimal_length * characteristics.max_shortening_velocity;
        self.velocity.as_ref().map(|v| v.scale(1.0 / scale))
    }
}

/// Force curves selected by muscle kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ForceCurves {
    /// No length or velocity dependence.
    Idealized,
    /// Generic Hill curves.
    Hill(HillCurves),
    /// Thelen curves, optionally without the passive element.
    Thelen {
        /// Curve parameters.
        curves: ThelenCurves,
        /// Drop the passive force-length element.
        active_only: bool,
    },
    /// De Groote smooth curves.
    DeGroote(DeGrooteCurves),
}

impl ForceCurves {
    /// Default curves for a declared muscle kind.
    #[must_use]
    pub fn for_kind(kind: MuscleKind) -> Self {
        match kind {
            MuscleKind::IdealizedActuator => Self::Idealized,
            MuscleKind::Hill => Self::Hill(HillCurves::default()),
            MuscleKind::HillThelen => Self::Thelen {
                curves: ThelenCurves::default(),
                active_only: false,
            },
            MuscleKind::HillThelenActiveOnly => Self::Thelen {
                curves: ThelenCurves::default(),
                active_only: true,
            },
            MuscleKind::HillDeGroote => Self::DeGroote(DeGrooteCurves::default()),
        }
    }
}

/// Force evaluator for one muscle at its current fiber kinematics.
#[derive(Debug, Clone, Copy)]
pub struct MuscleForce<'a, S = f64> {
    curves: &'a ForceCurves,
    characteristics: &'a MuscleCharacteristics,
    fiber: &'a FiberKinematics<S>,
}

impl<'a, S: Evaluable> MuscleForce<'a, S> {
    /// Bind curves and characteristics to fiber kinematics.
    #[must_use]
    pub fn new(
        curves: &'a ForceCurves,
        characteristics: &'a MuscleCharacteristics,
        fiber: &'a FiberKinematics<S>,
    ) -> Self {
        Self {
            curves,
            characteristics,
            fiber,
        }
    }

    /// The fiber kinematics this evaluator is bound to.
    #[must_use]
    pub fn fiber(&self) -> &FiberKinematics<S> {
        self.fiber
    }

    /// Passive force-length multiplier.
    #[must_use]
    pub fn flpe(&self) -> S {
        let l = self.fiber.normalized_length(self.characteristics);
        match self.curves {
            ForceCurves::Idealized
            | ForceCurves::Thelen {
                active_only: true, ..
            } => S::zero(),
            ForceCurves::Hill(c) => c.passive_force_length(&l),
            ForceCurves::Thelen { curves, .. } => curves.passive_force_length(&l),
            ForceCurves::DeGroote(c) => c.passive_force_length(&l),
        }
    }

    /// Active force-length multiplier for the given activation state.
    #[must_use]
    pub fn flce(&self, state: &ActivationState<S>) -> S {
        let l = self.fiber.normalized_length(self.characteristics);
        match self.curves {
            ForceCurves::Idealized => S::one(),
            ForceCurves::Hill(c) => c.active_force_length(&l, state.activation()),
            ForceCurves::Thelen { curves, .. } => {
                curves.active_force_length(&l, state.activation())
            }
            ForceCurves::DeGroote(c) => c.active_force_length(&l),
        }
    }

    /// Force-velocity multiplier, `None` without fiber velocity.
    #[must_use]
    pub fn fvce(&self) -> Option<S> {
        let v = self.fiber.normalized_velocity(self.characteristics)?;
        Some(match self.curves {
            ForceCurves::Idealized => S::one(),
            ForceCurves::Hill(c) => c.force_velocity(&v),
            ForceCurves::Thelen { curves, .. } => curves.force_velocity(&v),
            ForceCurves::DeGroote(c) => c.force_velocity(&v),
        })
    }

    /// Net force along the line of action.
    ///
    /// Without fiber velocity the force-velocity multiplier is taken as 1.
    #[must_use]
    pub fn force(&self, state: &ActivationState<S>) -> S {
        let f_max = self.characteristics.max_isometric_force;
        let a = state.activation().clone();
        if matches!(self.curves, ForceCurves::Idealized) {
            return a.scale(f_max);
        }
        let fv = self.fvce().unwrap_or_else(S::one);
        let total = a * self.flce(state) * fv + self.flpe();
        total.scale(f_max * self.characteristics.pennation_angle.cos())
    }
}
