//! The ODE vector field of a musculoskeletal model.
//!
//! The state is `y = [q, q̇]` with `2·n_q` entries. For a torque control
//!
//! ```text
//! ẏ = [q̇, FD(q, q̇, τ)]
//! ```
//!
//! and for an excitation control the torque is first obtained from the
//! muscles, `τ = Σ r(q)·F(a, l(q), v(q, q̇))`, before the same solve.

use nalgebra::DVector;
use sim_core::MusculoskeletalEngine;
use sim_muscle::ActivationState;
use tracing::{trace, warn};

use crate::control::{Control, ExcitationWiring};
use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;

/// State derivative function bound to a model.
///
/// Holds the model exclusively for its lifetime.
#[derive(Debug)]
pub struct DynamicsFunction<'m, E> {
    model: &'m mut Model<E>,
    warned_unwired: bool,
}

impl<'m, E: MusculoskeletalEngine> DynamicsFunction<'m, E> {
    /// Bind to `model`.
    pub fn new(model: &'m mut Model<E>) -> Self {
        Self {
            model,
            warned_unwired: false,
        }
    }

    /// State dimension, `2·n_q`.
    #[must_use]
    pub fn dimension(&self) -> usize {
        2 * self.model.n_q()
    }

    /// Check state and control lengths.
    fn check(&self, state: &[E::Scalar], control: &Control<DVector<E::Scalar>>) -> Result<()> {
        MusculoskeletalError::check_len("state", self.dimension(), state.len())?;
        let kind = control.kind();
        let expected = kind.expected_len(self.model.n_q(), self.model.n_muscles());
        MusculoskeletalError::check_len(kind.label(), expected, control.values().len())
    }

    /// Muscle states that drive the excitation branch.
    fn muscle_states(&mut self, excitation: &DVector<E::Scalar>) -> Vec<ActivationState<E::Scalar>> {
        match self.model.wiring() {
            ExcitationWiring::ModelState => {
                if !self.warned_unwired {
                    warn!(
                        model = self.model.name(),
                        "excitation control is not wired to muscle activation; \
                         using the engine's stored muscle states"
                    );
                    self.warned_unwired = true;
                }
                self.model.engine().state_set().to_vec()
            }
            ExcitationWiring::Direct => excitation
                .iter()
                .cloned()
                .map(ActivationState::from_excitation)
                .collect(),
        }
    }

    /// `ẏ` at `(t, y)` under `control`.
    ///
    /// Lengths are checked before any engine call.
    pub fn derivative(
        &mut self,
        t: f64,
        state: &[E::Scalar],
        control: &Control<DVector<E::Scalar>>,
    ) -> Result<DVector<E::Scalar>> {
        self.check(state, control)?;
        let n_q = self.model.n_q();
        let (q, qdot) = state.split_at(n_q);

        let tau = match control {
            Control::Torque(tau) => tau.clone(),
            Control::Excitation(excitation) => {
                let states = self.muscle_states(excitation);
                self.model
                    .engine_mut()
                    .muscular_joint_torque(&states, q, qdot)?
            }
        };
        let qddot = self
            .model
            .engine_mut()
            .forward_dynamics(q, qdot, tau.as_slice())?;
        trace!(t, kind = %control.kind(), "state derivative");

        Ok(DVector::from_iterator(
            2 * n_q,
            qdot.iter().cloned().chain(qddot.iter().cloned()),
        ))
    }
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Bind a derivative function to this model.
    pub fn dynamics(&mut self) -> DynamicsFunction<'_, E> {
        DynamicsFunction::new(self)
    }

    /// One-shot forward dynamics: returns `(q̇, q̈)`.
    pub fn forward_dynamics(
        &mut self,
        pose: &[E::Scalar],
        velocity: &[E::Scalar],
        control: &Control<DVector<E::Scalar>>,
    ) -> Result<(DVector<E::Scalar>, DVector<E::Scalar>)> {
        let n_q = self.n_q();
        MusculoskeletalError::check_len("pose", n_q, pose.len())?;
        MusculoskeletalError::check_len("velocity", n_q, velocity.len())?;
        let state: Vec<E::Scalar> = pose.iter().chain(velocity).cloned().collect();

        let derivative = self.dynamics().derivative(0.0, &state, control)?;
        let qdot = DVector::from_iterator(n_q, derivative.iter().take(n_q).cloned());
        let qddot = DVector::from_iterator(n_q, derivative.iter().skip(n_q).cloned());
        Ok((qdot, qddot))
    }
}
