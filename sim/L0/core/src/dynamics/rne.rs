//! Recursive Newton-Euler for a planar serial chain.
//!
//! Computes the joint torques `τ = M(q)·q̈ + c(q, q̇)` needed to produce a
//! given acceleration. Gravity is introduced as an upward acceleration of
//! the base, so the same pass yields inverse dynamics (gravity on), the
//! bias vector (`q̈ = 0`) and mass-matrix columns (`q̇ = 0`, gravity off,
//! `q̈ = e_j`).
//!
//! Link `i` points along `u_i = (sin φ_i, -cos φ_i)` with the absolute angle
//! `φ_i = Σ_{k≤i} q_k`, so the zero pose hangs straight down.
//!
//! Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 5

use nalgebra::DMatrix;
use sim_types::Evaluable;

use crate::config::LinkConfig;

type Planar<S> = (S, S);

fn cross<S: Evaluable>(a: &Planar<S>, b: &Planar<S>) -> S {
    a.0.clone() * b.1.clone() - a.1.clone() * b.0.clone()
}

fn scaled<S: Evaluable>(v: &Planar<S>, k: f64) -> Planar<S> {
    (v.0.scale(k), v.1.scale(k))
}

/// Acceleration of a point at offset `p` on a body rotating at `ω`, `α`.
fn point_acceleration<S: Evaluable>(base: &Planar<S>, p: &Planar<S>, omega: &S, alpha: &S) -> Planar<S> {
    let w2 = omega.clone() * omega.clone();
    (
        base.0.clone() - alpha.clone() * p.1.clone() - w2.clone() * p.0.clone(),
        base.1.clone() + alpha.clone() * p.0.clone() - w2 * p.1.clone(),
    )
}

struct LinkFrame<S> {
    tip: Planar<S>,
    com: Planar<S>,
    alpha: S,
    com_acceleration: Planar<S>,
}

/// Inverse dynamics of the chain.
///
/// `gravity` is the magnitude of gravitational acceleration along -y; pass
/// zero to omit it. Slices shorter than `links` truncate the chain.
pub fn planar_rne<S: Evaluable>(
    links: &[LinkConfig],
    q: &[S],
    qdot: &[S],
    qddot: &[S],
    gravity: f64,
) -> Vec<S> {
    let mut phi = S::zero();
    let mut omega = S::zero();
    let mut alpha = S::zero();
    let mut origin_acceleration = (S::zero(), S::constant(gravity));
    let mut frames = Vec::with_capacity(links.len());

    // Forward pass: kinematics from base to tip
    for (((link, qi), qdi), qddi) in links.iter().zip(q).zip(qdot).zip(qddot) {
        phi = phi + qi.clone();
        omega = omega + qdi.clone();
        alpha = alpha + qddi.clone();

        let direction = (phi.sin(), -phi.cos());
        let tip = scaled(&direction, link.length);
        let com = scaled(&direction, link.com);

        let com_acceleration = point_acceleration(&origin_acceleration, &com, &omega, &alpha);
        origin_acceleration = point_acceleration(&origin_acceleration, &tip, &omega, &alpha);
        frames.push(LinkFrame {
            tip,
            com,
            alpha: alpha.clone(),
            com_acceleration,
        });
    }

    // Backward pass: forces and moments from tip to base
    let mut force: Planar<S> = (S::zero(), S::zero());
    let mut moment = S::zero();
    let mut tau = vec![S::zero(); frames.len()];
    for (i, (frame, link)) in frames.iter().zip(links).enumerate().rev() {
        let inertial = scaled(&frame.com_acceleration, link.mass);
        moment = moment
            + frame.alpha.scale(link.inertia)
            + cross(&frame.com, &inertial)
            + cross(&frame.tip, &force);
        force = (inertial.0 + force.0, inertial.1 + force.1);
        tau[i] = moment.clone();
    }
    tau
}

/// Joint-space mass matrix via unit-acceleration passes.
pub fn mass_matrix<S: Evaluable>(links: &[LinkConfig], q: &[S]) -> DMatrix<S> {
    let n = links.len();
    let zeros = vec![S::zero(); n];
    let mut m = DMatrix::from_element(n, n, S::zero());
    for j in 0..n {
        let mut unit = zeros.clone();
        unit[j] = S::one();
        let column = planar_rne(links, q, &zeros, &unit, 0.0);
        for (i, value) in column.into_iter().enumerate() {
            m[(i, j)] = value;
        }
    }
    m
}

/// Bias forces `c(q, q̇)`: gravity, Coriolis and centrifugal terms.
pub fn bias_forces<S: Evaluable>(links: &[LinkConfig], q: &[S], qdot: &[S], gravity: f64) -> Vec<S> {
    let zeros = vec![S::zero(); links.len()];
    planar_rne(links, q, qdot, &zeros, gravity)
}
