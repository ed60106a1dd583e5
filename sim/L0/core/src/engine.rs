//! The musculoskeletal engine contract.
//!
//! An engine owns a skeleton, its muscles and a kinematic cache. Muscle
//! length and velocity depend on that cache, so they are only reachable
//! through the [`KinematicContext`] returned by
//! [`MusculoskeletalEngine::update_muscles`]:
//!
//! ```text
//!   update_muscles(q, q̇) ──► KinematicContext ──► length(j), velocity(j),
//!                                                fiber(j), descriptor(j)
//! ```
//!
//! The context borrows the engine, so the cache cannot be refreshed again
//! while results from the previous update are still being read.

use nalgebra::DVector;
use sim_muscle::{ActivationState, FiberKinematics, MuscleCharacteristics, MuscleDescriptor};
use sim_types::Evaluable;

use crate::error::{EngineError, Result};

/// A rigid-body and muscle engine.
///
/// Every method that takes a pose, velocity or torque checks its length and
/// fails with [`EngineError::DimensionMismatch`] before touching any state.
pub trait MusculoskeletalEngine {
    /// Scalar type of poses, forces and accelerations.
    type Scalar: Evaluable;

    /// Model name.
    fn name(&self) -> &str;

    /// Number of generalized coordinates.
    fn n_q(&self) -> usize;

    /// Number of muscles.
    fn n_muscles(&self) -> usize;

    /// Description of muscle `index`.
    fn muscle(&self, index: usize) -> Result<&MuscleDescriptor>;

    /// Mutable physiological parameters of muscle `index`.
    fn characteristics_mut(&mut self, index: usize) -> Result<&mut MuscleCharacteristics>;

    /// Push a pose (and optionally a velocity) into the kinematic cache.
    fn update_muscles(
        &mut self,
        pose: &[Self::Scalar],
        velocity: Option<&[Self::Scalar]>,
    ) -> Result<KinematicContext<'_, Self::Scalar>>;

    /// Joint accelerations produced by `torque` at `(pose, velocity)`.
    fn forward_dynamics(
        &mut self,
        pose: &[Self::Scalar],
        velocity: &[Self::Scalar],
        torque: &[Self::Scalar],
    ) -> Result<DVector<Self::Scalar>>;

    /// Joint torque generated by muscles in the given activation states.
    fn muscular_joint_torque(
        &mut self,
        states: &[ActivationState<Self::Scalar>],
        pose: &[Self::Scalar],
        velocity: &[Self::Scalar],
    ) -> Result<DVector<Self::Scalar>>;

    /// The engine's stored muscle states, one per muscle.
    fn state_set(&self) -> &[ActivationState<Self::Scalar>];

    /// Replace the stored muscle states.
    fn set_state_set(&mut self, states: Vec<ActivationState<Self::Scalar>>) -> Result<()>;
}

/// Per-muscle kinematics after a cache update.
#[derive(Debug, Clone, Copy)]
pub struct KinematicContext<'a, S> {
    muscles: &'a [MuscleDescriptor],
    lengths: &'a [S],
    velocities: Option<&'a [S]>,
}

impl<'a, S: Evaluable> KinematicContext<'a, S> {
    /// Wrap cached musculotendon lengths and, if updated, velocities.
    #[must_use]
    pub fn new(muscles: &'a [MuscleDescriptor], lengths: &'a [S], velocities: Option<&'a [S]>) -> Self {
        Self {
            muscles,
            lengths,
            velocities,
        }
    }

    /// Number of muscles.
    #[must_use]
    pub fn n_muscles(&self) -> usize {
        self.muscles.len()
    }

    /// Whether the update included velocities.
    #[must_use]
    pub fn has_velocity(&self) -> bool {
        self.velocities.is_some()
    }

    fn out_of_range(&self, index: usize) -> EngineError {
        EngineError::MuscleIndexOutOfRange {
            index,
            count: self.muscles.len(),
        }
    }

    /// Description of muscle `index`.
    pub fn descriptor(&self, index: usize) -> Result<&'a MuscleDescriptor> {
        self.muscles.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Musculotendon length of muscle `index`.
    pub fn length(&self, index: usize) -> Result<&'a S> {
        self.lengths.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Musculotendon velocity of muscle `index`.
    pub fn velocity(&self, index: usize) -> Result<&'a S> {
        if index >= self.muscles.len() {
            return Err(self.out_of_range(index));
        }
        let velocities = self
            .velocities
            .ok_or(EngineError::VelocityRequired { index })?;
        velocities.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Fiber kinematics of muscle `index`; velocity is present only if the
    /// update included joint velocities.
    pub fn fiber(&self, index: usize) -> Result<FiberKinematics<S>> {
        let descriptor = self.descriptor(index)?;
        let length = self.length(index)?.clone();
        let velocity = match self.velocities {
            Some(_) => Some(self.velocity(index)?.clone()),
            None => None,
        };
        Ok(descriptor.fiber(length, velocity))
    }
}
