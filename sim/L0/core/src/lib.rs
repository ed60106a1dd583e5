//! Musculoskeletal engine contract and a reference planar engine.
//!
//! This crate defines what the musculoskeletal layer expects from a
//! rigid-body and muscle engine, and provides one implementation of it:
//!
//! - [`MusculoskeletalEngine`] is the contract: dimensions, muscle
//!   descriptors, a kinematic cache refreshed by `update_muscles`, forward
//!   dynamics and muscle-induced joint torque.
//! - [`KinematicContext`] is the only way to read per-muscle length and
//!   velocity, and it exists only after a cache update.
//! - [`PlanarSkeleton`] is a serial chain of revolute joints in a vertical
//!   plane with Hill-type muscles, generic over the scalar backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SkeletonConfig                          │
//! │  Static: links, muscles (kind, characteristics, path)       │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PlanarSkeleton<S>                         │
//! │  Dynamic: muscle states, kinematic cache (lengths, vels)    │
//! │  forward_dynamics: RNE mass matrix + bias, Cholesky solve   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use sim_core::{MusculoskeletalEngine, NumericSkeleton};
//!
//! let mut arm = NumericSkeleton::planar_arm();
//! let qddot = arm.forward_dynamics(&[0.0, 0.5], &[0.0, 0.0], &[0.0, 0.0])?;
//! assert_eq!(qddot.len(), arm.n_q());
//!
//! let ctx = arm.update_muscles(&[0.0, 0.5], None)?;
//! let biceps_length = *ctx.length(2)?;
//! assert!(biceps_length > 0.0);
//! # Ok::<(), sim_core::EngineError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/sim-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::doc_markdown,               // Not all technical terms need backticks
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod linalg;
pub mod skeleton;

pub use config::{LinkConfig, SkeletonConfig};
pub use engine::{KinematicContext, MusculoskeletalEngine};
pub use error::{EngineError, Result};
pub use skeleton::{NumericSkeleton, PlanarSkeleton, SymbolicSkeleton};
