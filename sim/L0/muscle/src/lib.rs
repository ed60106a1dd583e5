//! Hill-type muscle models for musculoskeletal dynamics.
//!
//! This crate describes muscles; it does not own any skeletal state. A muscle
//! is a [`MuscleDescriptor`]: a declared [`MuscleKind`], physiological
//! [`MuscleCharacteristics`], the [`ForceCurves`] of that kind and a
//! [`MusclePath`] mapping joint angles to musculotendon length.
//!
//! # Hill-Type Muscle Model
//!
//! ```text
//!                    ┌──────────────────────┐
//!                    │    Muscle-Tendon     │
//!                    │         Unit         │
//!                    │  ┌────┐    ┌────┐    │
//!    Activation ────►│  │ CE │────│ SE │────┼───► Force
//!        a           │  └────┘    │    │    │
//!                    │  ┌────┐    │    │    │
//!                    │  │ PE │────┘    │    │
//!                    │  └────┘         │    │
//!                    └─────────────────┼────┘
//!                          rigid tendon┘
//! ```
//!
//! - **CE**: active force, scaled by activation, force-length (FlCE) and
//!   force-velocity (FvCE).
//! - **PE**: passive force-length (FlPE) at long fiber lengths.
//! - **SE**: the tendon, modeled as rigid.
//!
//! # Scalar Backends
//!
//! Every curve and path function is generic over [`sim_types::Evaluable`].
//! With `f64` they compute values; with [`sim_types::Expr`] they build an
//! expression graph that can be evaluated later for many bindings.
//!
//! # Quick Start
//!
//! ```
//! use sim_muscle::{ActivationState, MuscleCharacteristics, MuscleDescriptor, MuscleKind, MusclePath, PolynomialMomentArm};
//!
//! let biceps = MuscleDescriptor::new("biceps", MuscleKind::HillThelen, MuscleCharacteristics::biceps())
//!     .with_path(MusclePath::new(0.40).with_span(0, PolynomialMomentArm::constant(0.04)));
//!
//! let (length, velocity) = (biceps.path.length(&[0.3]), biceps.path.velocity(&[0.3], &[0.0]));
//! let fiber = biceps.fiber(length, Some(velocity));
//! let force = biceps.force_model(&fiber).force(&ActivationState::from_excitation(0.7));
//! assert!(force > 0.0);
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # References
//!
//! - Hill, A.V. (1938). The heat of shortening and the dynamic constants of muscle.
//! - Zajac, F.E. (1989). Muscle and tendon: properties, models, scaling.
//! - Thelen, D.G. (2003). Adjustment of muscle mechanics model parameters.
//! - De Groote, F. et al. (2016). Evaluation of direct collocation optimal
//!   control problem formulations for solving the muscle redundancy problem.

#![doc(html_root_url = "https://docs.rs/sim-muscle/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::similar_names,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss,
    clippy::imprecise_flops
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod activation;
pub mod curves;
pub mod hill;
pub mod kinematics;

use sim_types::Evaluable;

pub use activation::ActivationState;
pub use curves::{DeGrooteCurves, HillCurves, ThelenCurves};
pub use hill::{FiberKinematics, ForceCurves, MuscleCharacteristics, MuscleForce, MuscleKind};
pub use kinematics::{JointSpan, MusclePath, PolynomialMomentArm};

/// Everything an engine needs to know about one muscle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MuscleDescriptor {
    /// Muscle name.
    pub name: String,
    /// Declared muscle type.
    pub kind: MuscleKind,
    /// Physiological parameters.
    pub characteristics: MuscleCharacteristics,
    /// Force curves, by default those of `kind`.
    pub curves: ForceCurves,
    /// Musculotendon path across the joints.
    pub path: MusclePath,
}

impl MuscleDescriptor {
    /// A muscle with the default curves of `kind` and a path that crosses
    /// no joint, held at its optimal musculotendon length.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: MuscleKind,
        characteristics: MuscleCharacteristics,
    ) -> Self {
        let path = MusclePath::new(characteristics.optimal_musculotendon_length());
        Self {
            name: name.into(),
            kind,
            curves: ForceCurves::for_kind(kind),
            characteristics,
            path,
        }
    }

    /// Replace the path.
    #[must_use]
    pub fn with_path(mut self, path: MusclePath) -> Self {
        self.path = path;
        self
    }

    /// Replace the force curves.
    #[must_use]
    pub fn with_curves(mut self, curves: ForceCurves) -> Self {
        self.curves = curves;
        self
    }

    /// Fiber kinematics for a musculotendon length and velocity.
    pub fn fiber<S: Evaluable>(&self, mt_length: S, mt_velocity: Option<S>) -> FiberKinematics<S> {
        FiberKinematics::from_musculotendon(&self.characteristics, mt_length, mt_velocity)
    }

    /// Force evaluator bound to `fiber`.
    pub fn force_model<'a, S: Evaluable>(
        &'a self,
        fiber: &'a FiberKinematics<S>,
    ) -> MuscleForce<'a, S> {
        MuscleForce::new(&self.curves, &self.characteristics, fiber)
    }
}
