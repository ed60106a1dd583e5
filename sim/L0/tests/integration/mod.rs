//! Integration tests for the musculoskeletal crates.
//!
//! These tests exercise the full stack, from muscle curves through the
//! planar engine to the batch evaluator, dynamics function and integrators:
//! - Contract properties of the core operations
//! - Fail-fast behavior observed through a spying engine
//! - Numeric and symbolic models agreeing on the same inputs
//! - Muscle-driven trajectories

pub mod contract_properties;
pub mod fail_fast;
pub mod symbolic_mode;
pub mod trajectories;
