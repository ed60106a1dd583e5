//! Shared fixtures for the musculoskeletal integration tests.
//!
//! [`SpyEngine`] wraps the planar reference engine and records every call
//! that can touch engine state, so tests can assert that a failing
//! operation was rejected before the engine was reached.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

use nalgebra::DVector;
use sim_core::{
    EngineError, KinematicContext, LinkConfig, MusculoskeletalEngine, NumericSkeleton,
    SkeletonConfig,
};
use sim_muscle::{
    ActivationState, MuscleCharacteristics, MuscleDescriptor, MuscleKind, MusclePath,
    PolynomialMomentArm,
};

/// Counts of engine calls that may mutate state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    /// `update_muscles` calls.
    pub update_muscles: usize,
    /// `forward_dynamics` calls.
    pub forward_dynamics: usize,
    /// `muscular_joint_torque` calls.
    pub muscular_joint_torque: usize,
    /// `characteristics_mut` calls.
    pub characteristics_mut: usize,
    /// `set_state_set` calls.
    pub set_state_set: usize,
}

impl CallLog {
    /// Total number of recorded calls.
    pub fn total(&self) -> usize {
        self.update_muscles
            + self.forward_dynamics
            + self.muscular_joint_torque
            + self.characteristics_mut
            + self.set_state_set
    }
}

/// A numeric engine that records its calls.
#[derive(Debug, Clone)]
pub struct SpyEngine {
    inner: NumericSkeleton,
    log: CallLog,
}

impl SpyEngine {
    /// Spy on `inner`.
    pub fn new(inner: NumericSkeleton) -> Self {
        Self {
            inner,
            log: CallLog::default(),
        }
    }

    /// Two joints, five muscles.
    pub fn planar_arm() -> Self {
        Self::new(NumericSkeleton::planar_arm())
    }

    /// Three joints with one Hill muscle across the middle joint.
    pub fn three_link() -> Result<Self, EngineError> {
        let characteristics = MuscleCharacteristics::biceps();
        let reference = characteristics.optimal_musculotendon_length();
        let config = SkeletonConfig::new("three_link")
            .with_link(LinkConfig::rod("thigh", 0.40, 7.0))
            .with_link(LinkConfig::rod("shank", 0.40, 3.5))
            .with_link(LinkConfig::rod("foot", 0.20, 1.0))
            .with_muscle(
                MuscleDescriptor::new("knee_flexor", MuscleKind::Hill, characteristics).with_path(
                    MusclePath::new(reference).with_span(1, PolynomialMomentArm::constant(0.03)),
                ),
            );
        Ok(Self::new(NumericSkeleton::new(config)?))
    }

    /// Calls recorded so far.
    pub fn log(&self) -> CallLog {
        self.log
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &NumericSkeleton {
        &self.inner
    }
}

impl MusculoskeletalEngine for SpyEngine {
    type Scalar = f64;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn n_q(&self) -> usize {
        self.inner.n_q()
    }

    fn n_muscles(&self) -> usize {
        self.inner.n_muscles()
    }

    fn muscle(&self, index: usize) -> sim_core::Result<&MuscleDescriptor> {
        self.inner.muscle(index)
    }

    fn characteristics_mut(&mut self, index: usize) -> sim_core::Result<&mut MuscleCharacteristics> {
        self.log.characteristics_mut += 1;
        self.inner.characteristics_mut(index)
    }

    fn update_muscles(
        &mut self,
        pose: &[f64],
        velocity: Option<&[f64]>,
    ) -> sim_core::Result<KinematicContext<'_, f64>> {
        self.log.update_muscles += 1;
        self.inner.update_muscles(pose, velocity)
    }

    fn forward_dynamics(
        &mut self,
        pose: &[f64],
        velocity: &[f64],
        torque: &[f64],
    ) -> sim_core::Result<DVector<f64>> {
        self.log.forward_dynamics += 1;
        self.inner.forward_dynamics(pose, velocity, torque)
    }

    fn muscular_joint_torque(
        &mut self,
        states: &[ActivationState<f64>],
        pose: &[f64],
        velocity: &[f64],
    ) -> sim_core::Result<DVector<f64>> {
        self.log.muscular_joint_torque += 1;
        self.inner.muscular_joint_torque(states, pose, velocity)
    }

    fn state_set(&self) -> &[ActivationState<f64>] {
        self.inner.state_set()
    }

    fn set_state_set(&mut self, states: Vec<ActivationState<f64>>) -> sim_core::Result<()> {
        self.log.set_state_set += 1;
        self.inner.set_state_set(states)
    }
}
