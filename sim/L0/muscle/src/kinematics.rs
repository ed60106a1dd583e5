//! Musculotendon path kinematics and moment arm models.
//!
//! A [`MusclePath`] spans one or more joints. Each span carries a moment arm
//! `r(θ)` and the musculotendon length follows from integrating it:
//!
//! ```text
//! L_mt(q) = L_ref - Σ_j ∫₀^{q_j} r_j(θ) dθ
//! v_mt    = -Σ_j r_j(q_j) * q̇_j
//! τ_j     = r_j(q_j) * F
//! ```
//!
//! A positive moment arm therefore means the muscle shortens as the joint
//! angle increases and produces positive joint torque when pulling.

use sim_types::Evaluable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Polynomial moment arm model.
///
/// ```text
/// r(θ) = c₀ + c₁θ + c₂θ² + ...
/// ```
///
/// # Example
///
/// ```
/// use sim_muscle::PolynomialMomentArm;
///
/// // r = 0.05 - 0.01*θ + 0.005*θ²
/// let model = PolynomialMomentArm::new(vec![0.05, -0.01, 0.005]);
/// let r: f64 = model.moment_arm(&0.5);
/// assert!((r - 0.04625).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolynomialMomentArm {
    coefficients: Vec<f64>,
}

impl PolynomialMomentArm {
    /// Create a polynomial moment arm from coefficients `[c₀, c₁, ...]`.
    #[must_use]
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// A moment arm that does not vary with joint angle.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// `r = r₀ + r₁θ`.
    #[must_use]
    pub fn linear(r0: f64, r1: f64) -> Self {
        Self::new(vec![r0, r1])
    }

    /// `r = r₀ + r₁θ + r₂θ²`.
    #[must_use]
    pub fn quadratic(r0: f64, r1: f64, r2: f64) -> Self {
        Self::new(vec![r0, r1, r2])
    }

    /// The polynomial coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Moment arm at `joint_angle`.
    pub fn moment_arm<S: Evaluable>(&self, joint_angle: &S) -> S {
        horner(self.coefficients.iter().copied(), joint_angle)
    }

    /// `∫₀^θ r(s) ds`.
    pub fn integral<S: Evaluable>(&self, joint_angle: &S) -> S {
        let integrated = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| c / (i + 1) as f64);
        horner(integrated, joint_angle) * joint_angle.clone()
    }
}

// Horner evaluation, highest power first.
fn horner<S: Evaluable>(coefficients: impl DoubleEndedIterator<Item = f64>, x: &S) -> S {
    coefficients
        .rev()
        .fold(S::zero(), |acc, c| acc * x.clone() + S::constant(c))
}

/// The part of a muscle path that crosses one joint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSpan {
    /// Index of the generalized coordinate crossed.
    pub joint: usize,
    /// Moment arm about that coordinate.
    pub moment_arm: PolynomialMomentArm,
}

/// Path of a musculotendon unit across one or more joints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MusclePath {
    /// Musculotendon length with every crossed joint at zero (m).
    pub reference_length: f64,
    spans: Vec<JointSpan>,
}

impl MusclePath {
    /// A path with no joint crossings yet.
    #[must_use]
    pub fn new(reference_length: f64) -> Self {
        Self {
            reference_length,
            spans: Vec::new(),
        }
    }

    /// Add a joint crossing.
    #[must_use]
    pub fn with_span(mut self, joint: usize, moment_arm: PolynomialMomentArm) -> Self {
        self.spans.push(JointSpan { joint, moment_arm });
        self
    }

    /// The joint crossings.
    #[must_use]
    pub fn spans(&self) -> &[JointSpan] {
        &self.spans
    }

    /// Highest joint index crossed, if any.
    #[must_use]
    pub fn max_joint(&self) -> Option<usize> {
        self.spans.iter().map(|s| s.joint).max()
    }

    /// Musculotendon length at `pose`.
    ///
    /// Spans referring to coordinates beyond `pose` contribute nothing; the
    /// engine validates spans against its coordinate count on construction.
    pub fn length<S: Evaluable>(&self, pose: &[S]) -> S {
        self.spans
            .iter()
            .filter_map(|span| pose.get(span.joint).map(|q| span.moment_arm.integral(q)))
            .fold(S::constant(self.reference_length), |acc, dl| acc - dl)
    }

    /// Musculotendon lengthening velocity.
    pub fn velocity<S: Evaluable>(&self, pose: &[S], velocity: &[S]) -> S {
        self.spans
            .iter()
            .filter_map(|span| {
                let q = pose.get(span.joint)?;
                let qdot = velocity.get(span.joint)?;
                Some(span.moment_arm.moment_arm(q) * qdot.clone())
            })
            .fold(S::zero(), |acc, rv| acc - rv)
    }

    /// Moment arm about coordinate `joint`, zero if the path does not cross it.
    pub fn moment_arm<S: Evaluable>(&self, joint: usize, pose: &[S]) -> S {
        self.spans
            .iter()
            .filter(|span| span.joint == joint)
            .filter_map(|span| pose.get(joint).map(|q| span.moment_arm.moment_arm(q)))
            .fold(S::zero(), |acc, r| acc + r)
    }
}
