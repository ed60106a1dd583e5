//! Data for force-length-velocity views.

use nalgebra::DMatrix;
use sim_core::MusculoskeletalEngine;
use sim_types::Samples;
use tracing::debug;

use crate::error::{MusculoskeletalError, Result};
use crate::model::Model;

/// `samples[:, col]` repeated `n` times.
fn repeat_column(samples: &Samples, col: usize, n: usize) -> Samples {
    match samples {
        Samples::Numeric(m) => Samples::Numeric(DMatrix::from_fn(m.nrows(), n, |r, _| m[(r, col)])),
        Samples::Symbolic(m) => {
            Samples::Symbolic(DMatrix::from_fn(m.nrows(), n, |r, _| m[(r, col)].clone()))
        }
    }
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Active force-length times force-velocity of one muscle over the grid
    /// of every pose column crossed with every velocity column.
    ///
    /// Returns `z` with `z[(v, q)] = FlCE · FvCE` at pose column `q` and
    /// velocity column `v`, so `z` is `K_v × K_q`. `excitation` has one
    /// column per velocity sample.
    pub fn force_length_velocity_surface(
        &mut self,
        excitation: &Samples,
        poses: &Samples,
        velocities: &Samples,
        muscle: usize,
    ) -> Result<DMatrix<f64>> {
        let (n_poses, n_velocities) = (poses.ncols(), velocities.ncols());
        MusculoskeletalError::check_len("poses", self.n_q(), poses.nrows())?;
        debug!(muscle, n_poses, n_velocities, "force-length-velocity surface");

        let mut z = DMatrix::zeros(n_velocities, n_poses);
        for i in 0..n_poses {
            let repeated = repeat_column(poses, i, n_velocities);
            let coefficients =
                self.muscle_force_coefficients(excitation, &repeated, Some(velocities), muscle)?;
            let active = coefficients.active.materialize()?;
            let velocity = coefficients
                .velocity
                .map(|v| v.materialize())
                .transpose()?
                .unwrap_or_else(|| DMatrix::from_element(1, n_velocities, 1.0));
            for v in 0..n_velocities {
                z[(v, i)] = active[(0, v)] * velocity[(0, v)];
            }
        }
        Ok(z)
    }
}
