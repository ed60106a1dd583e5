//! Force-length and force-velocity curves for muscle modeling.
//!
//! Three curve families are provided, one per Hill-type variant. All of them
//! take normalized quantities:
//!
//! ```text
//! l̃ = fiber length / optimal fiber length
//! ṽ = fiber velocity / (optimal fiber length * max shortening velocity)
//! ```
//!
//! so that `l̃ = 1` is optimal length, `ṽ = -1` is maximum shortening and
//! `ṽ > 0` is lengthening.
//!
//! Curves are generic over [`Evaluable`] and avoid data-dependent `if`
//! branches; piecewise sections use [`Evaluable::select_positive`] so the
//! same code traces a symbolic graph.
//!
//! # References
//!
//! - Hill, A.V. (1938). The heat of shortening and dynamic constants of muscle.
//! - Zajac, F.E. (1989). Muscle and tendon: properties, models, scaling, and
//!   application to biomechanics and motor control.
//! - Thelen, D.G. (2003). Adjustment of muscle mechanics model parameters to
//!   simulate dynamic contractions in older adults.
//! - De Groote, F. et al. (2016). Evaluation of direct collocation optimal
//!   control problem formulations for solving the muscle redundancy problem.

use sim_types::Evaluable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Effective normalized length when optimal length grows as activation drops.
///
/// `l_opt(a) = l_opt * (shift * (1 - a) + 1)`
fn shifted_length<S: Evaluable>(normalized_length: &S, activation: &S, shift: f64) -> S {
    let scale = (S::one() - activation.clone()).scale(shift) + S::one();
    normalized_length.clone() / scale
}

/// Parameters for the generic Hill curves.
///
/// Active force-length is an asymmetric Gaussian that is zero outside
/// `[min_normalized_length, max_normalized_length]`; passive force rises
/// exponentially above slack; force-velocity is Hill's hyperbola when
/// shortening and saturates toward `eccentric_force_max` when lengthening.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HillCurves {
    /// Width of the ascending limb (normalized length units).
    pub width_ascending: f64,

    /// Width of the descending limb (normalized length units).
    pub width_descending: f64,

    /// Minimum normalized length where any active force can be produced.
    pub min_normalized_length: f64,

    /// Maximum normalized length where any active force can be produced.
    pub max_normalized_length: f64,

    /// Normalized length at which passive force begins.
    pub passive_slack_length: f64,

    /// Exponential shape factor of the passive curve.
    pub passive_shape_factor: f64,

    /// Curvature of the concentric (shortening) hyperbola.
    pub curvature_concentric: f64,

    /// Maximum eccentric force multiplier.
    pub eccentric_force_max: f64,

    /// Curvature of the eccentric (lengthening) branch.
    pub curvature_eccentric: f64,

    /// Relative growth of optimal length at zero activation.
    pub activation_shift: f64,
}

impl Default for HillCurves {
    fn default() -> Self {
        Self {
            width_ascending: 0.45,
            width_descending: 0.56,
            min_normalized_length: 0.5,
            max_normalized_length: 1.6,
            passive_slack_length: 1.0,
            passive_shape_factor: 4.0,
            curvature_concentric: 0.25,
            eccentric_force_max: 1.5,
            curvature_eccentric: 0.25,
            activation_shift: 0.15,
        }
    }
}

impl HillCurves {
    /// Active force-length multiplier in [0, 1].
    pub fn active_force_length<S: Evaluable>(&self, normalized_length: &S, activation: &S) -> S {
        let l = shifted_length(normalized_length, activation, self.activation_shift);
        let offset = l.clone() - S::one();

        let bell = |width: f64| (-(offset.clone() / S::constant(width)).powi(2)).exp();
        let value = S::select_positive(
            &(S::one() - l.clone()),
            bell(self.width_ascending),
            bell(self.width_descending),
        );

        // zero outside (min, max)
        let above_min = l.clone() - S::constant(self.min_normalized_length);
        let below_max = S::constant(self.max_normalized_length) - l;
        S::select_positive(
            &above_min,
            S::select_positive(&below_max, value, S::zero()),
            S::zero(),
        )
    }

    /// Passive force-length multiplier, zero below slack.
    pub fn passive_force_length<S: Evaluable>(&self, normalized_length: &S) -> S {
        let stretch = normalized_length.clone() - S::constant(self.passive_slack_length);
        let strain = stretch.clone() / S::constant(1.5 - self.passive_slack_length);
        let n = self.passive_shape_factor;
        let value = (strain.scale(n).exp() - S::one()) / S::constant(n.exp() - 1.0);
        S::select_positive(&stretch, value, S::zero())
    }

    /// Force-velocity multiplier: 0 at `ṽ = -1`, 1 when isometric.
    pub fn force_velocity<S: Evaluable>(&self, normalized_velocity: &S) -> S {
        let v = normalized_velocity.clone();
        let a = self.curvature_concentric;
        let concentric = (S::one() + v.clone()) / (S::one() - v.scale(1.0 / a));

        let ae = self.curvature_eccentric;
        let eccentric = S::one()
            + v.scale(self.eccentric_force_max - 1.0) / (v.clone() + S::constant(ae));

        S::select_positive(
            &v,
            eccentric,
            S::select_positive(&(v.clone() + S::one()), concentric, S::zero()),
        )
    }
}

/// Thelen (2003) curve parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThelenCurves {
    /// Shape factor of the active Gaussian (γ).
    pub gamma: f64,

    /// Exponential shape factor of the passive curve (k_PE).
    pub k_passive: f64,

    /// Passive strain at one isometric force (ε0).
    pub passive_strain_at_one: f64,

    /// Hill curvature constant (A_f).
    pub curvature: f64,

    /// Maximum lengthening force multiplier (F_len).
    pub lengthening_force_max: f64,

    /// Relative growth of optimal length at zero activation.
    pub activation_shift: f64,
}

impl Default for ThelenCurves {
    fn default() -> Self {
        Self {
            gamma: 0.45,
            k_passive: 4.0,
            passive_strain_at_one: 0.6,
            curvature: 0.25,
            lengthening_force_max: 1.4,
            activation_shift: 0.15,
        }
    }
}

impl ThelenCurves {
    /// `exp(-(l̃ - 1)² / γ)` evaluated at the activation-shifted length.
    pub fn active_force_length<S: Evaluable>(&self, normalized_length: &S, activation: &S) -> S {
        let l = shifted_length(normalized_length, activation, self.activation_shift);
        (-(l - S::one()).powi(2) / S::constant(self.gamma)).exp()
    }

    /// Exponential passive curve, zero below optimal length.
    pub fn passive_force_length<S: Evaluable>(&self, normalized_length: &S) -> S {
        let stretch = normalized_length.clone() - S::one();
        let k = self.k_passive;
        let value = (stretch.scale(k / self.passive_strain_at_one).exp() - S::one())
            / S::constant(k.exp() - 1.0);
        S::select_positive(&stretch, value, S::zero())
    }

    /// Thelen force-velocity relation solved for force.
    ///
    /// Shortening: `(1 + ṽ) / (1 - ṽ / A_f)`.
    /// Lengthening: `(1 + ṽ k F_len) / (1 + ṽ k)` with
    /// `k = (2 + 2 / A_f) / (F_len - 1)`.
    pub fn force_velocity<S: Evaluable>(&self, normalized_velocity: &S) -> S {
        let v = normalized_velocity.clone();
        let af = self.curvature;
        let flen = self.lengthening_force_max;
        let k = (2.0 + 2.0 / af) / (flen - 1.0);

        let concentric = (S::one() + v.clone()) / (S::one() - v.scale(1.0 / af));
        let eccentric = (S::one() + v.scale(k * flen)) / (S::one() + v.scale(k));

        S::select_positive(
            &v,
            eccentric,
            S::select_positive(&(v.clone() + S::one()), concentric, S::zero()),
        )
    }
}

/// De Groote (2016) smooth curve parameters.
///
/// These curves are differentiable everywhere, which is why they are the
/// usual choice for gradient-based optimal control.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeGrooteCurves {
    /// Gaussian terms `[b1, b2, b3, b4]` of the active force-length sum.
    pub active: [[f64; 4]; 3],

    /// Exponential shape factor of the passive curve.
    pub k_passive: f64,

    /// Passive strain at one isometric force.
    pub passive_strain_at_one: f64,

    /// Force-velocity constants `[d1, d2, d3, d4]`.
    pub velocity: [f64; 4],
}

impl Default for DeGrooteCurves {
    fn default() -> Self {
        Self {
            active: [
                [0.815, 1.055, 0.162, 0.063],
                [0.433, 0.717, -0.030, 0.200],
                [0.100, 1.000, 0.354, 0.000],
            ],
            k_passive: 4.0,
            passive_strain_at_one: 0.6,
            velocity: [-0.318, -8.149, -0.374, 0.886],
        }
    }
}

impl DeGrooteCurves {
    /// Sum of three Gaussians `b1 exp(-½ (l̃ - b2)² / (b3 + b4 l̃)²)`.
    pub fn active_force_length<S: Evaluable>(&self, normalized_length: &S) -> S {
        self.active
            .iter()
            .fold(S::zero(), |acc, &[b1, b2, b3, b4]| {
                let num = (normalized_length.clone() - S::constant(b2)).powi(2);
                let den = (S::constant(b3) + normalized_length.scale(b4)).powi(2);
                acc + (-(num / den).scale(0.5)).exp().scale(b1)
            })
    }

    /// Smooth exponential passive curve.
    pub fn passive_force_length<S: Evaluable>(&self, normalized_length: &S) -> S {
        let k = self.k_passive;
        let stretch = normalized_length.clone() - S::one();
        (stretch.scale(k / self.passive_strain_at_one).exp() - S::one())
            / S::constant(k.exp() - 1.0)
    }

    /// `d1 ln(d2 ṽ + d3 + sqrt((d2 ṽ + d3)² + 1)) + d4`.
    pub fn force_velocity<S: Evaluable>(&self, normalized_velocity: &S) -> S {
        let [d1, d2, d3, d4] = self.velocity;
        let inner = normalized_velocity.scale(d2) + S::constant(d3);
        let asinh = (inner.clone() + (inner.powi(2) + S::one()).sqrt()).ln();
        asinh.scale(d1) + S::constant(d4)
    }
}
