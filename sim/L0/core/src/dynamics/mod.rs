//! Rigid-body dynamics of the planar chain.

pub mod rne;

pub use rne::{bias_forces, mass_matrix, planar_rne};
