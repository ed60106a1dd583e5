//! Forward dynamics, trajectory integration and muscle mechanics on top of a
//! musculoskeletal engine.
//!
//! A [`Model`] wraps any [`sim_core::MusculoskeletalEngine`] and provides:
//!
//! - **Muscle queries** at one pose through [`MuscleModelAdapter`], and over
//!   batches of independent samples with [`Model::muscles_kinematics`],
//!   [`Model::muscle_force_coefficients`] and [`Model::muscle_force`].
//! - **Dynamics**: [`DynamicsFunction`] turns a state `[q, q̇]` and a
//!   [`Control`] (joint torques or muscle excitations) into `[q̇, q̈]`.
//! - **Integration**: [`Model::integrate`] samples a trajectory with adaptive
//!   RK45 or fixed-step RK4.
//! - **Parameters**: [`Model::get_muscle_parameter`] and
//!   [`Model::set_muscle_parameter`].
//!
//! # Data Flow
//!
//! ```text
//!  t_samples, y₀, ControlInput
//!            │
//!            ▼
//!   ┌─────────────────┐   Control::Torque(τ)    ┌──────────────────────┐
//!   │  Integrator     │────────────────────────►│ forward_dynamics     │
//!   │  (RK45 / RK4)   │                         │ (q, q̇, τ) ──► q̈      │
//!   └────────┬────────┘   Control::Excitation   └──────────▲───────────┘
//!            │            ┌───────────────────────┐        │ τ
//!            └───────────►│ muscular_joint_torque │────────┘
//!                         └───────────────────────┘
//! ```
//!
//! # Numeric and Symbolic Models
//!
//! The engine's scalar decides the mode. Over `f64` every call computes
//! values; over [`sim_types::Expr`] every call builds expression graph nodes
//! that are evaluated later, which changes the cost of each call but not
//! its result. Batch inputs are [`sim_types::Samples`] and must all share
//! one representation. Integration is numeric only.
//!
//! # Exclusive Access
//!
//! Every query refreshes the engine's kinematic cache in place, so a model
//! serves one caller at a time (`&mut self`). Run one model per worker for
//! parallel evaluation.
//!
//! # Quick Start
//!
//! ```
//! use nalgebra::DVector;
//! use sim_core::NumericSkeleton;
//! use sim_musculoskeletal::{Control, ControlInput, IntegrationMethod, Model};
//!
//! let mut model = Model::new(NumericSkeleton::planar_arm());
//!
//! let (_, qddot) = model.forward_dynamics(
//!     &[0.2, 0.6],
//!     &[0.0, 0.0],
//!     &Control::Torque(DVector::zeros(2)),
//! )?;
//! assert_eq!(qddot.len(), 2);
//!
//! let t: Vec<f64> = (0..=10).map(|i| 0.01 * f64::from(i)).collect();
//! let trajectory = model.integrate(
//!     &t,
//!     &[0.2, 0.6, 0.0, 0.0],
//!     &ControlInput::zero_torque(2),
//!     IntegrationMethod::Rk45,
//! )?;
//! assert_eq!(trajectory.len(), 11);
//! # Ok::<(), sim_musculoskeletal::MusculoskeletalError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/sim-musculoskeletal/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops,
    clippy::many_single_char_names
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod adapter;
pub mod analysis;
pub mod batch;
pub mod control;
pub mod dynamics;
pub mod error;
pub mod integrate;
pub mod model;
pub mod parameter;
pub mod selection;

pub use adapter::{ForceCurveValues, MuscleModel, MuscleModelAdapter};
pub use batch::{ForceCoefficients, MuscleKinematics};
pub use control::{Control, ControlInput, ControlKind, ControlSchedule, ExcitationWiring};
pub use dynamics::DynamicsFunction;
pub use error::{MusculoskeletalError, Result};
pub use integrate::{
    ControlledDynamics, IntegrationMethod, IntegratorConfig, OdeSystem, Trajectory,
};
pub use model::Model;
pub use parameter::MuscleParameter;
pub use selection::MuscleSelection;
