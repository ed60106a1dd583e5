//! Trajectory integration.
//!
//! Two explicit Runge-Kutta schemes drive an [`OdeSystem`] through a set of
//! requested sample times:
//!
//! | method | step control | module |
//! |--------|--------------|--------|
//! | [`IntegrationMethod::Rk45`] | adaptive, Dormand-Prince 5(4) | [`rk45`] |
//! | [`IntegrationMethod::Rk4`]  | fixed, classic 4-stage | [`rk4`] |
//!
//! Both land exactly on every sample time and return one state column per
//! sample, the first being the initial state.

pub mod rk4;
pub mod rk45;

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use sim_core::MusculoskeletalEngine;
use tracing::debug;

use crate::control::ControlInput;
use crate::dynamics::DynamicsFunction;
use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ODE integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntegrationMethod {
    /// Adaptive Dormand-Prince 5(4).
    #[default]
    Rk45,
    /// Fixed-step classic Runge-Kutta.
    Rk4,
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rk45 => write!(f, "RK45"),
            Self::Rk4 => write!(f, "RK4"),
        }
    }
}

impl FromStr for IntegrationMethod {
    type Err = MusculoskeletalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RK45" => Ok(Self::Rk45),
            "RK4" => Ok(Self::Rk4),
            _ => Err(MusculoskeletalError::UnsupportedIntegrationMethod { name: s.to_string() }),
        }
    }
}

/// Tolerances and step limits shared by both methods.
///
/// `max_step` bounds the adaptive step and sets the RK4 sub-step count; with
/// the default (infinite) value RK4 takes one step per sample interval.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegratorConfig {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Largest step allowed.
    pub max_step: f64,
    /// Initial adaptive step; chosen automatically when `None`.
    pub first_step: Option<f64>,
    /// Budget of attempted steps over the whole trajectory.
    pub max_steps: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_step: f64::INFINITY,
            first_step: None,
            max_steps: 100_000,
        }
    }
}

impl IntegratorConfig {
    /// Tight tolerances for reference solutions.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            rtol: 1e-9,
            atol: 1e-12,
            ..Self::default()
        }
    }

    /// Set the relative tolerance.
    #[must_use]
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Set the absolute tolerance.
    #[must_use]
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Set the largest step.
    #[must_use]
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Fix the initial adaptive step.
    #[must_use]
    pub fn with_first_step(mut self, first_step: f64) -> Self {
        self.first_step = Some(first_step);
        self
    }

    /// Set the step budget.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Check that tolerances and step limits are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) {
            return Err(MusculoskeletalError::invalid_config("rtol must be positive"));
        }
        // a zero atol makes the error scale vanish on zero state components
        if !(self.atol > 0.0 && self.atol.is_finite()) {
            return Err(MusculoskeletalError::invalid_config("atol must be positive"));
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(MusculoskeletalError::invalid_config("max_step must be positive"));
        }
        if let Some(h) = self.first_step {
            if !(h > 0.0 && h.is_finite()) {
                return Err(MusculoskeletalError::invalid_config(
                    "first_step must be positive and finite",
                ));
            }
        }
        if self.max_steps == 0 {
            return Err(MusculoskeletalError::invalid_config("max_steps must be at least 1"));
        }
        Ok(())
    }
}

/// A first-order ODE `ẏ = f(t, y)` over `f64` state vectors.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// `f(t, y)`.
    fn derivative(&mut self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>>;
}

/// The dynamics of a numeric model under a control input.
#[derive(Debug)]
pub struct ControlledDynamics<'m, 'c, E> {
    dynamics: DynamicsFunction<'m, E>,
    control: &'c ControlInput,
}

impl<'m, 'c, E: MusculoskeletalEngine<Scalar = f64>> ControlledDynamics<'m, 'c, E> {
    /// Bind `control` to the dynamics of `model`.
    pub fn new(model: &'m mut Model<E>, control: &'c ControlInput) -> Self {
        Self {
            dynamics: DynamicsFunction::new(model),
            control,
        }
    }
}

impl<E: MusculoskeletalEngine<Scalar = f64>> OdeSystem for ControlledDynamics<'_, '_, E> {
    fn dimension(&self) -> usize {
        self.dynamics.dimension()
    }

    fn derivative(&mut self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>> {
        let control = self.control.at(t);
        self.dynamics.derivative(t, y.as_slice(), &control)
    }
}

/// Pose and velocity sampled at the requested times.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Sample times.
    pub times: Vec<f64>,
    /// Poses, `n_q × N`.
    pub poses: DMatrix<f64>,
    /// Velocities, `n_q × N`.
    pub velocities: DMatrix<f64>,
}

impl Trajectory {
    /// Split stacked `[q; q̇]` state columns.
    #[must_use]
    pub fn from_states(times: Vec<f64>, states: &DMatrix<f64>) -> Self {
        let n_q = states.nrows() / 2;
        Self {
            times,
            poses: states.rows(0, n_q).into_owned(),
            velocities: states.rows(n_q, n_q).into_owned(),
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the trajectory has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Pose at sample `index`.
    #[must_use]
    pub fn pose(&self, index: usize) -> Option<DVector<f64>> {
        (index < self.poses.ncols()).then(|| self.poses.column(index).into_owned())
    }

    /// Velocity at sample `index`.
    #[must_use]
    pub fn velocity(&self, index: usize) -> Option<DVector<f64>> {
        (index < self.velocities.ncols()).then(|| self.velocities.column(index).into_owned())
    }
}

/// Reject empty, non-finite or non-increasing sample times.
pub fn validate_time_samples(t_samples: &[f64]) -> Result<()> {
    if t_samples.is_empty() {
        return Err(MusculoskeletalError::invalid_time_samples("no sample times"));
    }
    if let Some(t) = t_samples.iter().find(|t| !t.is_finite()) {
        return Err(MusculoskeletalError::invalid_time_samples(format!(
            "sample time {t} is not finite"
        )));
    }
    if let Some(w) = t_samples.windows(2).find(|w| w[1] <= w[0]) {
        return Err(MusculoskeletalError::invalid_time_samples(format!(
            "sample times must be strictly increasing, got {} then {}",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Fail with [`MusculoskeletalError::Diverged`] if `y` is not finite.
pub(crate) fn ensure_finite(t: f64, y: &DVector<f64>) -> Result<()> {
    if y.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MusculoskeletalError::Diverged { t })
    }
}

/// Integrate `system` from `y0` and sample it at `t_samples`.
///
/// Returns a `dimension × N` matrix whose first column is `y0`.
pub fn solve<O: OdeSystem>(
    system: &mut O,
    t_samples: &[f64],
    y0: &DVector<f64>,
    method: IntegrationMethod,
    config: &IntegratorConfig,
) -> Result<DMatrix<f64>> {
    validate_time_samples(t_samples)?;
    config.validate()?;
    MusculoskeletalError::check_len("initial state", system.dimension(), y0.len())?;
    ensure_finite(t_samples[0], y0)?;

    match method {
        IntegrationMethod::Rk45 => rk45::integrate(system, t_samples, y0, config),
        IntegrationMethod::Rk4 => rk4::integrate(system, t_samples, y0, config),
    }
}

impl<E: MusculoskeletalEngine<Scalar = f64>> Model<E> {
    /// Integrate the model under `control`, sampling at `t_samples`.
    ///
    /// Tolerances and step limits come from [`Model::integrator_config`].
    pub fn integrate(
        &mut self,
        t_samples: &[f64],
        initial_state: &[f64],
        control: &ControlInput,
        method: IntegrationMethod,
    ) -> Result<Trajectory> {
        let config = self.integrator_config().clone();
        let y0 = DVector::from_column_slice(initial_state);
        debug!(
            model = self.name(),
            %method,
            samples = t_samples.len(),
            control = %control.kind(),
            "integrating trajectory"
        );

        let mut system = ControlledDynamics::new(self, control);
        let states = solve(&mut system, t_samples, &y0, method, &config)?;
        Ok(Trajectory::from_states(t_samples.to_vec(), &states))
    }
}
