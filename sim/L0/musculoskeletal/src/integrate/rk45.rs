//! Adaptive Dormand-Prince 5(4).
//!
//! The fifth-order solution is propagated and the embedded fourth-order one
//! estimates the local error. A step is accepted when the RMS of
//! `err / (atol + rtol·max(|y|, |y_new|))` is below one; the next step size
//! is then scaled by `safety · err^(-1/5)`, clamped to `[0.2, 10]`, and
//! never grows right after a rejection.
//!
//! Steps are clipped so that every requested sample time is landed on
//! exactly; a clipped step does not shrink the step size proposed for the
//! next one.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use super::{IntegratorConfig, OdeSystem, ensure_finite};
use crate::error::{MusculoskeletalError, Result};

const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];

const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

/// Difference between the fifth- and fourth-order weights, including the
/// first-same-as-last stage.
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339_200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// Order of the error estimator.
const ERROR_ORDER: f64 = 4.0;
const ERROR_EXPONENT: f64 = -1.0 / (ERROR_ORDER + 1.0);

/// Root-mean-square norm.
fn rms(v: &DVector<f64>) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        (v.norm_squared() / v.len() as f64).sqrt()
    }
}

/// Componentwise error scale `atol + rtol·max(|a|, |b|)`.
fn error_scale(config: &IntegratorConfig, a: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
    a.zip_map(b, |x, y| config.atol + config.rtol * x.abs().max(y.abs()))
}

/// Smallest step distinguishable at time `t`.
fn min_step(t: f64) -> f64 {
    10.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE)
}

/// Starting step from the local scale of `y0` and its derivatives
/// (Hairer, Nørsett and Wanner, section II.4).
pub fn initial_step<O: OdeSystem>(
    system: &mut O,
    t0: f64,
    y0: &DVector<f64>,
    f0: &DVector<f64>,
    span: f64,
    config: &IntegratorConfig,
) -> Result<f64> {
    let scale = y0.map(|y| config.atol + config.rtol * y.abs());
    let d0 = rms(&y0.component_div(&scale));
    let d1 = rms(&f0.component_div(&scale));
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
    .min(span);

    let y1 = y0 + f0 * h0;
    let f1 = system.derivative(t0 + h0, &y1)?;
    let d2 = rms(&(f1 - f0).component_div(&scale)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (ERROR_ORDER + 1.0))
    };
    Ok((100.0 * h0).min(h1).min(span).min(config.max_step))
}

/// Solver state between steps.
struct DormandPrince<'s, O> {
    system: &'s mut O,
    config: &'s IntegratorConfig,
    t: f64,
    y: DVector<f64>,
    f: DVector<f64>,
    h_abs: f64,
    accepted: usize,
    rejected: usize,
}

impl<O: OdeSystem> DormandPrince<'_, O> {
    fn attempts(&self) -> usize {
        self.accepted + self.rejected
    }

    /// Stages for a step of size `h`; returns the new state, its derivative
    /// and the local error estimate.
    fn stages(&mut self, h: f64) -> Result<(DVector<f64>, DVector<f64>, DVector<f64>)> {
        let mut k: Vec<DVector<f64>> = Vec::with_capacity(7);
        k.push(self.f.clone());
        for s in 1..6 {
            let mut dy = DVector::zeros(self.y.len());
            for (kj, &a) in k.iter().zip(&A[s][..s]) {
                dy.axpy(a * h, kj, 1.0);
            }
            let ks = self.system.derivative(self.t + C[s] * h, &(&self.y + dy))?;
            k.push(ks);
        }

        let mut y_new = self.y.clone();
        for (kj, &b) in k.iter().zip(&B) {
            y_new.axpy(b * h, kj, 1.0);
        }
        ensure_finite(self.t + h, &y_new)?;
        let f_new = self.system.derivative(self.t + h, &y_new)?;
        k.push(f_new.clone());

        let mut error = DVector::zeros(self.y.len());
        for (kj, &e) in k.iter().zip(&E) {
            error.axpy(e * h, kj, 1.0);
        }
        Ok((y_new, f_new, error))
    }

    /// Take one accepted step without passing `t_bound`.
    fn step(&mut self, t_bound: f64) -> Result<()> {
        let mut step_rejected = false;
        loop {
            if self.attempts() >= self.config.max_steps {
                return Err(MusculoskeletalError::StepLimitExceeded {
                    max_steps: self.config.max_steps,
                    t: self.t,
                });
            }
            let floor = min_step(self.t);
            if self.h_abs < floor {
                return Err(MusculoskeletalError::StepSizeUnderflow {
                    t: self.t,
                    step: self.h_abs,
                });
            }

            let mut h = self.h_abs;
            let clipped = self.t + h >= t_bound;
            if clipped {
                h = t_bound - self.t;
            }

            let (y_new, f_new, error) = self.stages(h)?;
            let scale = error_scale(self.config, &self.y, &y_new);
            let error_norm = rms(&error.component_div(&scale));

            if error_norm < 1.0 {
                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * error_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                };
                if step_rejected {
                    factor = factor.min(1.0);
                }
                let proposed = (h * factor).min(self.config.max_step);
                self.h_abs = if clipped {
                    self.h_abs.max(proposed)
                } else {
                    proposed
                };

                self.t = if clipped { t_bound } else { self.t + h };
                self.y = y_new;
                self.f = f_new;
                self.accepted += 1;
                trace!(t = self.t, h, error_norm, "accepted step");
                return Ok(());
            }

            self.h_abs = h * (SAFETY * error_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR);
            self.rejected += 1;
            step_rejected = true;
            trace!(t = self.t, h, error_norm, "rejected step");
        }
    }

    /// Step until `t_bound` is reached exactly.
    fn advance_to(&mut self, t_bound: f64) -> Result<()> {
        while self.t < t_bound {
            self.step(t_bound)?;
        }
        Ok(())
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
    let (Some(&t0), Some(&t_end)) = (t_samples.first(), t_samples.last()) else {
        return Ok(states);
    };
    if t_samples.len() == 1 {
        return Ok(states);
    }

    let f0 = system.derivative(t0, y0)?;
    let h_abs = match config.first_step {
        Some(h) => h.min(config.max_step),
        None => initial_step(system, t0, y0, &f0, t_end - t0, config)?,
    };

    let mut solver = DormandPrince {
        system,
        config,
        t: t0,
        y: y0.clone(),
        f: f0,
        h_abs,
        accepted: 0,
        rejected: 0,
    };
    for (k, &t_bound) in t_samples.iter().enumerate().skip(1) {
        solver.advance_to(t_bound)?;
        states.set_column(k, &solver.y);
    }

    debug!(
        accepted = solver.accepted,
        rejected = solver.rejected,
        final_step = solver.h_abs,
        samples = t_samples.len(),
        "RK45 integration finished"
    );
    Ok(states)
}
