//! Scalar representations shared by the musculoskeletal crates.
//!
//! Every quantity that flows through the engine (poses, velocities, muscle
//! lengths, forces) is expressed with a scalar type implementing
//! [`Evaluable`]. Two backends exist:
//!
//! - [`f64`]: concrete numbers, evaluated immediately.
//! - [`Expr`]: nodes in a symbolic expression graph, built now and
//!   evaluated later.
//!
//! Algorithms are written once against [`Evaluable`] and run unchanged in
//! either mode. The difference matters for cost: a numeric call computes a
//! value, while a symbolic call only appends graph nodes. Engines that cache
//! kinematic state still mutate that cache in symbolic mode, but what they
//! cache is an expression, not a value.
//!
//! Batches of samples cross crate boundaries as [`Samples`], which tags the
//! matrix with its [`Representation`] so callers can detect mixed inputs.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![doc(html_root_url = "https://docs.rs/sim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod error;
pub mod evaluable;
pub mod expr;
pub mod samples;

pub use error::{Result, SymbolicError};
pub use evaluable::{Evaluable, Representation};
pub use expr::{Bindings, Expr};
pub use samples::Samples;
