//! Batch evaluation of muscle kinematics and forces.
//!
//! Every column of the input [`Samples`] is an independent sample. For each
//! column the engine's cache is refreshed once, then every selected muscle
//! is read out of the resulting context:
//!
//! ```text
//! for k in 0..K:
//!     ctx = update_muscles(poses[:, k], velocities[:, k])
//!     for j in selection:
//!         out[j - start, k] = query(ctx, j)
//! ```
//!
//! Outputs are always `n_selected × K` and carry the representation of the
//! inputs. All representation and shape checks run before the first engine
//! call.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use sim_core::MusculoskeletalEngine;
use sim_muscle::ActivationState;
use sim_types::{Evaluable, Representation, Samples};
use tracing::{debug, trace};

use crate::adapter::{MuscleModel, MuscleModelAdapter};
use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;
use crate::selection::MuscleSelection;

/// Musculotendon lengths and velocities, `n_selected × K`.
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleKinematics {
    /// Lengths (m).
    pub lengths: Samples,
    /// Velocities (m/s), present when velocities were supplied.
    pub velocities: Option<Samples>,
}

/// Force-curve multipliers, `n_selected × K`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceCoefficients {
    /// Passive force-length multiplier.
    pub passive: Samples,
    /// Active force-length multiplier.
    pub active: Samples,
    /// Force-velocity multiplier, present when velocities were supplied.
    pub velocity: Option<Samples>,
}

/// Validated shape of a batch call.
#[derive(Debug, Clone)]
struct BatchPlan {
    samples: usize,
    muscles: Range<usize>,
    representation: Representation,
}

/// Output matrix sized to a plan.
fn output<S: Evaluable>(plan: &BatchPlan) -> DMatrix<S> {
    DMatrix::from_element(plan.muscles.len(), plan.samples, S::zero())
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Check representations, shapes and the selection of a batch call.
    fn plan_batch(
        &self,
        poses: &Samples,
        velocities: Option<&Samples>,
        excitation: Option<&Samples>,
        selection: &MuscleSelection,
    ) -> Result<BatchPlan> {
        let representation = poses.representation();
        let others = [("velocities", velocities), ("excitation", excitation)];
        for (what, input) in others {
            if let Some(input) = input {
                if input.representation() != representation {
                    return Err(MusculoskeletalError::TypeMismatch {
                        what,
                        expected: representation,
                        actual: input.representation(),
                    });
                }
            }
        }
        if E::Scalar::REPRESENTATION == Representation::Numeric
            && representation == Representation::Symbolic
        {
            return Err(MusculoskeletalError::TypeMismatch {
                what: "poses",
                expected: Representation::Numeric,
                actual: Representation::Symbolic,
            });
        }

        let samples = poses.ncols();
        MusculoskeletalError::check_len("poses", self.n_q(), poses.nrows())?;
        if let Some(velocities) = velocities {
            MusculoskeletalError::check_len("velocities", self.n_q(), velocities.nrows())?;
            MusculoskeletalError::check_len("velocity samples", samples, velocities.ncols())?;
        }
        if let Some(excitation) = excitation {
            MusculoskeletalError::check_len("excitation", self.n_muscles(), excitation.nrows())?;
            MusculoskeletalError::check_len("excitation samples", samples, excitation.ncols())?;
        }

        let muscles = selection.resolve(self.n_muscles())?;
        Ok(BatchPlan {
            samples,
            muscles,
            representation,
        })
    }

    /// Fail on the first selected muscle the adapter cannot evaluate.
    fn check_kinds(&self, muscles: &Range<usize>) -> Result<()> {
        for index in muscles.clone() {
            let kind = self.engine().muscle(index)?.kind;
            MuscleModel::upcast(index, kind)?;
        }
        Ok(())
    }

    /// Read sample `col` as engine scalars.
    fn sample(
        poses: &Samples,
        velocities: Option<&Samples>,
        col: usize,
    ) -> Result<(DVector<E::Scalar>, Option<DVector<E::Scalar>>)> {
        let pose = poses.column_as::<E::Scalar>(col)?;
        let velocity = velocities
            .map(|v| v.column_as::<E::Scalar>(col))
            .transpose()?;
        Ok((pose, velocity))
    }

    /// Activation states for the selected muscles in sample `col`.
    fn states(
        &self,
        excitation: &Samples,
        muscles: &Range<usize>,
        col: usize,
    ) -> Result<Vec<ActivationState<E::Scalar>>> {
        muscles
            .clone()
            .map(|j| {
                excitation
                    .entry_as::<E::Scalar>(j, col)?
                    .map(ActivationState::from_excitation)
                    .ok_or_else(|| {
                        MusculoskeletalError::dimension(
                            "excitation",
                            self.n_muscles(),
                            excitation.nrows(),
                        )
                    })
            })
            .collect()
    }

    /// Musculotendon length (and velocity) of the selected muscles for every
    /// sample column.
    pub fn muscles_kinematics(
        &mut self,
        poses: &Samples,
        velocities: Option<&Samples>,
        selection: impl Into<MuscleSelection>,
    ) -> Result<MuscleKinematics> {
        let plan = self.plan_batch(poses, velocities, None, &selection.into())?;
        debug!(
            samples = plan.samples,
            muscles = plan.muscles.len(),
            representation = %plan.representation,
            "muscle kinematics batch"
        );

        let mut lengths = output::<E::Scalar>(&plan);
        let mut mt_velocities = velocities.map(|_| output::<E::Scalar>(&plan));
        for col in 0..plan.samples {
            let (pose, velocity) = Self::sample(poses, velocities, col)?;
            let ctx = self
                .engine_mut()
                .update_muscles(pose.as_slice(), velocity.as_ref().map(|v| v.as_slice()))?;
            for (row, j) in plan.muscles.clone().enumerate() {
                lengths[(row, col)] = ctx.length(j)?.clone();
                if let Some(out) = mt_velocities.as_mut() {
                    out[(row, col)] = ctx.velocity(j)?.clone();
                }
            }
            trace!(col, "muscle kinematics sample");
        }

        Ok(MuscleKinematics {
            lengths: Samples::from_scalars(lengths, plan.representation)?,
            velocities: mt_velocities
                .map(|v| Samples::from_scalars(v, plan.representation))
                .transpose()?,
        })
    }

    /// Passive, active and force-velocity multipliers of the selected
    /// muscles for every sample column.
    ///
    /// Excitation rows are indexed by global muscle index and taken as
    /// activation, i.e. each muscle is evaluated in state `(e, e)`.
    pub fn muscle_force_coefficients(
        &mut self,
        excitation: &Samples,
        poses: &Samples,
        velocities: Option<&Samples>,
        selection: impl Into<MuscleSelection>,
    ) -> Result<ForceCoefficients> {
        let plan = self.plan_batch(poses, velocities, Some(excitation), &selection.into())?;
        self.check_kinds(&plan.muscles)?;
        debug!(
            samples = plan.samples,
            muscles = plan.muscles.len(),
            representation = %plan.representation,
            "force coefficient batch"
        );

        let mut passive = output::<E::Scalar>(&plan);
        let mut active = output::<E::Scalar>(&plan);
        let mut velocity_out = velocities.map(|_| output::<E::Scalar>(&plan));
        for col in 0..plan.samples {
            let states = self.states(excitation, &plan.muscles, col)?;
            let (pose, velocity) = Self::sample(poses, velocities, col)?;
            let ctx = self
                .engine_mut()
                .update_muscles(pose.as_slice(), velocity.as_ref().map(|v| v.as_slice()))?;
            for ((row, j), state) in plan.muscles.clone().enumerate().zip(&states) {
                let values = MuscleModelAdapter::from_context(&ctx, j)?.curves(state);
                passive[(row, col)] = values.passive;
                active[(row, col)] = values.active;
                if let (Some(out), Some(fv)) = (velocity_out.as_mut(), values.velocity) {
                    out[(row, col)] = fv;
                }
            }
            trace!(col, "force coefficient sample");
        }

        Ok(ForceCoefficients {
            passive: Samples::from_scalars(passive, plan.representation)?,
            active: Samples::from_scalars(active, plan.representation)?,
            velocity: velocity_out
                .map(|v| Samples::from_scalars(v, plan.representation))
                .transpose()?,
        })
    }

    /// Net Hill-model force of the selected muscles for every sample column.
    ///
    /// Symbolic inputs yield a symbolic batch; call
    /// [`Samples::materialize`] on it for concrete values once every free
    /// symbol is closed.
    pub fn muscle_force(
        &mut self,
        excitation: &Samples,
        poses: &Samples,
        velocities: &Samples,
        selection: impl Into<MuscleSelection>,
    ) -> Result<Samples> {
        let plan = self.plan_batch(poses, Some(velocities), Some(excitation), &selection.into())?;
        self.check_kinds(&plan.muscles)?;
        debug!(
            samples = plan.samples,
            muscles = plan.muscles.len(),
            representation = %plan.representation,
            "muscle force batch"
        );

        let mut forces = output::<E::Scalar>(&plan);
        for col in 0..plan.samples {
            let states = self.states(excitation, &plan.muscles, col)?;
            let (pose, velocity) = Self::sample(poses, Some(velocities), col)?;
            let ctx = self
                .engine_mut()
                .update_muscles(pose.as_slice(), velocity.as_ref().map(|v| v.as_slice()))?;
            for ((row, j), state) in plan.muscles.clone().enumerate().zip(&states) {
                forces[(row, col)] = MuscleModelAdapter::from_context(&ctx, j)?.force(state);
            }
            trace!(col, "muscle force sample");
        }

        Ok(Samples::from_scalars(forces, plan.representation)?)
    }
}
