//! Fixed-step classic Runge-Kutta.
//!
//! Each sample interval `[t_k, t_{k+1}]` is split into
//! `ceil((t_{k+1} - t_k) / max_step)` equal sub-steps, so every sample time
//! is hit exactly.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::{IntegratorConfig, OdeSystem, ensure_finite};
use crate::error::{MusculoskeletalError, Result};

/// Butcher tableau nodes.
const RK4_TIME: [f64; 3] = [0.5, 0.5, 1.0];

/// Butcher tableau weights.
const RK4_B: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];

/// One RK4 step of size `h` from `(t, y)`.
pub fn step<O: OdeSystem>(system: &mut O, t: f64, y: &DVector<f64>, h: f64) -> Result<DVector<f64>> {
    let k1 = system.derivative(t, y)?;
    let k2 = system.derivative(t + RK4_TIME[0] * h, &(y + &k1 * (RK4_TIME[0] * h)))?;
    let k3 = system.derivative(t + RK4_TIME[1] * h, &(y + &k2 * (RK4_TIME[1] * h)))?;
    let k4 = system.derivative(t + RK4_TIME[2] * h, &(y + &k3 * (RK4_TIME[2] * h)))?;
    Ok(y + (k1 * RK4_B[0] + k2 * RK4_B[1] + k3 * RK4_B[2] + k4 * RK4_B[3]) * h)
}

/// Number of equal sub-steps for an interval of length `dt`.
fn substeps(dt: f64, max_step: f64) -> usize {
    if max_step.is_finite() {
        // dt and max_step are both positive here
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (dt / max_step).ceil() as usize;
        n.max(1)
    } else {
        1
    }
}

/// Integrate through `t_samples`; see [`super::solve`].
pub fn integrate<O: OdeSystem>(
    system: &mut O,
    t_samples: &[f64],
    y0: &DVector<f64>,
    config: &IntegratorConfig,
) -> Result<DMatrix<f64>> {
    let mut states = DMatrix::zeros(y0.len(), t_samples.len());
    states.set_column(0, y0);

    let mut y = y0.clone();
    let mut steps = 0;
    for (k, window) in t_samples.windows(2).enumerate() {
        let (t0, t1) = (window[0], window[1]);
        let n = substeps(t1 - t0, config.max_step);
        let h = (t1 - t0) / n as f64;
        for i in 0..n {
            if steps >= config.max_steps {
                return Err(MusculoskeletalError::StepLimitExceeded {
                    max_steps: config.max_steps,
                    t: t0 + i as f64 * h,
                });
            }
            let t = t0 + i as f64 * h;
            y = step(system, t, &y, h)?;
            steps += 1;
            ensure_finite(t + h, &y)?;
        }
        states.set_column(k + 1, &y);
    }

    debug!(steps, samples = t_samples.len(), "RK4 integration finished");
    Ok(states)
}
