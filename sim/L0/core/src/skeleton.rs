//! Reference engine: a planar chain of revolute joints driven by muscles.
//!
//! ```text
//!        ═══╤═══  base
//!           ●  q₀
//!           │  link 0
//!           ●  q₁
//!           │  link 1
//!           ○
//! ```
//!
//! Forward dynamics solves `M(q)·q̈ = τ - c(q, q̇)` with a Cholesky
//! factorization of the mass matrix. Muscle torque is the sum over muscles
//! of moment arm times Hill-model force:
//!
//! ```text
//! τ_j = Σ_m r_{m,j}(q_j) · F_m(a_m, l_m, v_m)
//! ```
//!
//! The same engine runs over `f64` ([`NumericSkeleton`]) or over symbolic
//! expressions ([`SymbolicSkeleton`]).

use nalgebra::DVector;
use sim_muscle::{ActivationState, MuscleCharacteristics, MuscleDescriptor};
use sim_types::{Evaluable, Expr};
use tracing::debug;

use crate::config::SkeletonConfig;
use crate::dynamics::{bias_forces, mass_matrix};
use crate::engine::{KinematicContext, MusculoskeletalEngine};
use crate::error::{EngineError, Result};
use crate::linalg::{cholesky_in_place, cholesky_solve_in_place};

/// Planar skeleton over concrete numbers.
pub type NumericSkeleton = PlanarSkeleton<f64>;

/// Planar skeleton that builds expression graphs.
pub type SymbolicSkeleton = PlanarSkeleton<Expr>;

/// A planar musculoskeletal chain.
#[derive(Debug, Clone)]
pub struct PlanarSkeleton<S = f64> {
    config: SkeletonConfig,
    states: Vec<ActivationState<S>>,
    lengths: Vec<S>,
    velocities: Option<Vec<S>>,
    cache_updates: usize,
}

impl<S: Evaluable> PlanarSkeleton<S> {
    /// Build an engine from a validated configuration.
    pub fn new(config: SkeletonConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            name = %config.name,
            n_q = config.n_q(),
            n_muscles = config.muscles.len(),
            "built planar skeleton"
        );
        Ok(Self::from_config_unchecked(config))
    }

    fn from_config_unchecked(config: SkeletonConfig) -> Self {
        let n_muscles = config.muscles.len();
        let lengths = config
            .muscles
            .iter()
            .map(|m| S::constant(m.path.reference_length))
            .collect();
        Self {
            config,
            states: vec![ActivationState::relaxed(); n_muscles],
            lengths,
            velocities: None,
            cache_updates: 0,
        }
    }

    /// Chain of `n` point-mass links with no muscles.
    #[must_use]
    pub fn n_link_pendulum(n: usize, link_length: f64, link_mass: f64) -> Self {
        Self::from_config_unchecked(SkeletonConfig::n_link_pendulum(n, link_length, link_mass))
    }

    /// One joint, one idealized flexor. See [`SkeletonConfig::single_joint_flexor`].
    #[must_use]
    pub fn single_joint_flexor() -> Self {
        Self::from_config_unchecked(SkeletonConfig::single_joint_flexor())
    }

    /// Two joints, five muscles. See [`SkeletonConfig::planar_arm`].
    #[must_use]
    pub fn planar_arm() -> Self {
        Self::from_config_unchecked(SkeletonConfig::planar_arm())
    }

    /// The configuration this engine was built from.
    #[must_use]
    pub fn config(&self) -> &SkeletonConfig {
        &self.config
    }

    /// How many times the kinematic cache has been refreshed.
    #[must_use]
    pub fn cache_updates(&self) -> usize {
        self.cache_updates
    }

    fn refresh_cache(&mut self, pose: &[S], velocity: Option<&[S]>) {
        let muscles = &self.config.muscles;
        self.lengths = muscles.iter().map(|m| m.path.length(pose)).collect();
        self.velocities =
            velocity.map(|v| muscles.iter().map(|m| m.path.velocity(pose, v)).collect());
        self.cache_updates += 1;
    }

    fn descriptor(&self, index: usize) -> Result<&MuscleDescriptor> {
        self.config
            .muscles
            .get(index)
            .ok_or(EngineError::MuscleIndexOutOfRange {
                index,
                count: self.config.muscles.len(),
            })
    }
}

impl<S: Evaluable> MusculoskeletalEngine for PlanarSkeleton<S> {
    type Scalar = S;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn n_q(&self) -> usize {
        self.config.n_q()
    }

    fn n_muscles(&self) -> usize {
        self.config.muscles.len()
    }

    fn muscle(&self, index: usize) -> Result<&MuscleDescriptor> {
        self.descriptor(index)
    }

    fn characteristics_mut(&mut self, index: usize) -> Result<&mut MuscleCharacteristics> {
        let count = self.config.muscles.len();
        self.config
            .muscles
            .get_mut(index)
            .map(|m| &mut m.characteristics)
            .ok_or(EngineError::MuscleIndexOutOfRange { index, count })
    }

    fn update_muscles(
        &mut self,
        pose: &[S],
        velocity: Option<&[S]>,
    ) -> Result<KinematicContext<'_, S>> {
        let n_q = self.n_q();
        EngineError::check_len("pose", n_q, pose.len())?;
        if let Some(v) = velocity {
            EngineError::check_len("velocity", n_q, v.len())?;
        }
        self.refresh_cache(pose, velocity);
        Ok(KinematicContext::new(
            &self.config.muscles,
            &self.lengths,
            self.velocities.as_deref(),
        ))
    }

    fn forward_dynamics(&mut self, pose: &[S], velocity: &[S], torque: &[S]) -> Result<DVector<S>> {
        let n_q = self.n_q();
        EngineError::check_len("pose", n_q, pose.len())?;
        EngineError::check_len("velocity", n_q, velocity.len())?;
        EngineError::check_len("torque", n_q, torque.len())?;

        let links = &self.config.links;
        let mut m = mass_matrix(links, pose);
        let bias = bias_forces(links, pose, velocity, self.config.gravity);
        let mut qddot = DVector::from_iterator(
            n_q,
            torque.iter().zip(bias).map(|(t, c)| t.clone() - c),
        );

        cholesky_in_place(&mut m)?;
        cholesky_solve_in_place(&m, &mut qddot);
        Ok(qddot)
    }

    fn muscular_joint_torque(
        &mut self,
        states: &[ActivationState<S>],
        pose: &[S],
        velocity: &[S],
    ) -> Result<DVector<S>> {
        let n_q = self.n_q();
        EngineError::check_len("muscle states", self.n_muscles(), states.len())?;
        EngineError::check_len("pose", n_q, pose.len())?;
        EngineError::check_len("velocity", n_q, velocity.len())?;

        self.refresh_cache(pose, Some(velocity));
        let velocities = self.velocities.as_deref().unwrap_or(&[]);

        let mut tau = vec![S::zero(); n_q];
        for (((muscle, state), length), mt_velocity) in self
            .config
            .muscles
            .iter()
            .zip(states)
            .zip(&self.lengths)
            .zip(velocities)
        {
            let fiber = muscle.fiber(length.clone(), Some(mt_velocity.clone()));
            let force = muscle.force_model(&fiber).force(state);
            for span in muscle.path.spans() {
                if let (Some(t), Some(q)) = (tau.get_mut(span.joint), pose.get(span.joint)) {
                    *t = t.clone() + span.moment_arm.moment_arm(q) * force.clone();
                }
            }
        }
        Ok(DVector::from_vec(tau))
    }

    fn state_set(&self) -> &[ActivationState<S>] {
        &self.states
    }

    fn set_state_set(&mut self, states: Vec<ActivationState<S>>) -> Result<()> {
        EngineError::check_len("muscle states", self.n_muscles(), states.len())?;
        self.states = states;
        Ok(())
    }
}
