//! Per-muscle queries at a single pose.
//!
//! The adapter classifies a muscle by its declared kind and binds the
//! matching force curves to the fiber kinematics read from a
//! [`KinematicContext`]. Reaching an adapter always goes through a cache
//! update first; [`Model::muscle_adapter`] performs that update.

use sim_core::{KinematicContext, MusculoskeletalEngine};
use sim_muscle::{ActivationState, FiberKinematics, MuscleDescriptor, MuscleKind};
use sim_types::Evaluable;

use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;

/// Muscle kinds the adapter can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuscleModel {
    /// Force equal to activation times maximum isometric force.
    IdealizedActuator,
    /// Generic Hill model.
    Hill,
    /// Thelen curves.
    HillThelen,
    /// De Groote curves.
    HillDeGroote,
}

impl MuscleModel {
    /// Classify muscle `index` by its declared kind.
    pub fn upcast(index: usize, kind: MuscleKind) -> Result<Self> {
        match kind {
            MuscleKind::IdealizedActuator => Ok(Self::IdealizedActuator),
            MuscleKind::Hill => Ok(Self::Hill),
            MuscleKind::HillThelen => Ok(Self::HillThelen),
            MuscleKind::HillDeGroote => Ok(Self::HillDeGroote),
            MuscleKind::HillThelenActiveOnly => {
                Err(MusculoskeletalError::UnsupportedMuscleType { index, kind })
            }
        }
    }

    /// The declared kind this model evaluates.
    #[must_use]
    pub fn kind(self) -> MuscleKind {
        match self {
            Self::IdealizedActuator => MuscleKind::IdealizedActuator,
            Self::Hill => MuscleKind::Hill,
            Self::HillThelen => MuscleKind::HillThelen,
            Self::HillDeGroote => MuscleKind::HillDeGroote,
        }
    }
}

/// Force-curve multipliers of one muscle.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceCurveValues<S> {
    /// Passive force-length multiplier.
    pub passive: S,
    /// Active force-length multiplier.
    pub active: S,
    /// Force-velocity multiplier, present when velocity was supplied.
    pub velocity: Option<S>,
}

/// One classified muscle at the pose of a kinematic context.
#[derive(Debug, Clone)]
pub struct MuscleModelAdapter<'a, S> {
    index: usize,
    model: MuscleModel,
    descriptor: &'a MuscleDescriptor,
    length: S,
    velocity: Option<S>,
    fiber: FiberKinematics<S>,
}

impl<'a, S: Evaluable> MuscleModelAdapter<'a, S> {
    /// Read muscle `index` out of a refreshed context.
    pub fn from_context(ctx: &KinematicContext<'a, S>, index: usize) -> Result<Self> {
        let descriptor = ctx.descriptor(index)?;
        let model = MuscleModel::upcast(index, descriptor.kind)?;
        let length = ctx.length(index)?.clone();
        let velocity = if ctx.has_velocity() {
            Some(ctx.velocity(index)?.clone())
        } else {
            None
        };
        let fiber = descriptor.fiber(length.clone(), velocity.clone());
        Ok(Self {
            index,
            model,
            descriptor,
            length,
            velocity,
            fiber,
        })
    }

    /// Muscle index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Classified muscle model.
    #[must_use]
    pub fn model(&self) -> MuscleModel {
        self.model
    }

    /// The engine's description of this muscle.
    #[must_use]
    pub fn descriptor(&self) -> &'a MuscleDescriptor {
        self.descriptor
    }

    /// Musculotendon length.
    #[must_use]
    pub fn length(&self) -> &S {
        &self.length
    }

    /// Musculotendon velocity, if the update included joint velocities.
    #[must_use]
    pub fn velocity(&self) -> Option<&S> {
        self.velocity.as_ref()
    }

    /// Fiber kinematics.
    #[must_use]
    pub fn fiber(&self) -> &FiberKinematics<S> {
        &self.fiber
    }

    /// Passive, active and force-velocity multipliers for `state`.
    #[must_use]
    pub fn curves(&self, state: &ActivationState<S>) -> ForceCurveValues<S> {
        let force = self.descriptor.force_model(&self.fiber);
        ForceCurveValues {
            passive: force.flpe(),
            active: force.flce(state),
            velocity: force.fvce(),
        }
    }

    /// Net Hill-model force for `state`.
    #[must_use]
    pub fn force(&self, state: &ActivationState<S>) -> S {
        self.descriptor.force_model(&self.fiber).force(state)
    }
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Refresh the kinematic cache at `(pose, velocity)` and return the
    /// adapter for muscle `index`.
    ///
    /// The muscle's kind is checked before the cache is touched.
    pub fn muscle_adapter(
        &mut self,
        pose: &[E::Scalar],
        velocity: Option<&[E::Scalar]>,
        index: usize,
    ) -> Result<MuscleModelAdapter<'_, E::Scalar>> {
        let kind = self.engine().muscle(index)?.kind;
        MuscleModel::upcast(index, kind)?;
        let ctx = self.engine_mut().update_muscles(pose, velocity)?;
        MuscleModelAdapter::from_context(&ctx, index)
    }
}
