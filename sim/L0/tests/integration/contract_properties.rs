//! Contract properties of the core musculoskeletal operations.
//!
//! Covers zero acceleration at rest, trajectory sampling, batch output
//! shapes, sub-range selection and agreement between integration methods.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;
use sim_core::NumericSkeleton;
use sim_musculoskeletal::{
    Control, ControlInput, IntegrationMethod, IntegratorConfig, Model, MuscleSelection,
};
use sim_types::Samples;

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Deterministic batch of `k` arm poses and velocities.
fn arm_batch(k: usize) -> (Samples, Samples, Samples) {
    let poses = DMatrix::from_fn(2, k, |r, c| 0.1 + 0.3 * r as f64 + 0.05 * c as f64);
    let velocities = DMatrix::from_fn(2, k, |r, c| (r as f64 - 0.5) * 0.4 * c as f64);
    let excitation = DMatrix::from_fn(5, k, |r, c| 0.1 + 0.15 * ((r + c) % 5) as f64);
    (
        Samples::Numeric(poses),
        Samples::Numeric(velocities),
        Samples::Numeric(excitation),
    )
}

// ============================================================================
// Forward dynamics
// ============================================================================

/// Test: one joint, one muscle, zero torque at the rest pose.
#[test]
fn test_rest_pose_zero_acceleration() {
    let mut model = Model::new(NumericSkeleton::single_joint_flexor());
    assert_eq!((model.n_q(), model.n_muscles()), (1, 1));

    let (qdot, qddot) = model
        .forward_dynamics(&[0.0], &[0.0], &Control::Torque(DVector::zeros(1)))
        .expect("forward dynamics");
    assert_eq!(qdot[0], 0.0);
    assert_relative_eq!(qddot[0], 0.0, epsilon = 1e-12);

    let (_, qddot) = model
        .forward_dynamics(&[0.0], &[0.0], &Control::Excitation(DVector::zeros(1)))
        .expect("forward dynamics");
    assert_relative_eq!(qddot[0], 0.0, epsilon = 1e-12);
}

// ============================================================================
// Trajectory sampling
// ============================================================================

/// Test: N sample times give N columns, the first being the initial state.
#[test]
fn test_trajectory_has_one_column_per_sample() {
    let y0 = [0.4, 0.9, -0.2, 0.3];
    for method in [IntegrationMethod::Rk45, IntegrationMethod::Rk4] {
        for n in [1, 2, 17] {
            let mut model = Model::new(NumericSkeleton::planar_arm());
            let t = if n == 1 { vec![0.0] } else { linspace(0.0, 0.2, n) };
            let trajectory = model
                .integrate(&t, &y0, &ControlInput::zero_torque(2), method)
                .expect("integration");
            assert_eq!(trajectory.poses.ncols(), n);
            assert_eq!(trajectory.velocities.ncols(), n);
            assert_relative_eq!(trajectory.poses[(0, 0)], y0[0]);
            assert_relative_eq!(trajectory.poses[(1, 0)], y0[1]);
            assert_relative_eq!(trajectory.velocities[(0, 0)], y0[2]);
            assert_relative_eq!(trajectory.velocities[(1, 0)], y0[3]);
        }
    }
}

/// Test: adaptive and fixed-step methods agree on a smooth problem.
#[test]
fn test_rk4_and_rk45_agree_under_zero_control() {
    let t = linspace(0.0, 0.5, 26);
    let y0 = [0.8, 0.3, 0.0, 0.0];

    let mut adaptive = Model::new(NumericSkeleton::planar_arm())
        .with_integrator(IntegratorConfig::default().with_rtol(1e-9).with_atol(1e-11));
    let mut fixed = Model::new(NumericSkeleton::planar_arm())
        .with_integrator(IntegratorConfig::default().with_max_step(5e-4));

    let control = ControlInput::zero_torque(2);
    let a = adaptive
        .integrate(&t, &y0, &control, IntegrationMethod::Rk45)
        .expect("RK45");
    let b = fixed
        .integrate(&t, &y0, &control, IntegrationMethod::Rk4)
        .expect("RK4");
    assert_relative_eq!(a.poses, b.poses, epsilon = 1e-6);
    assert_relative_eq!(a.velocities, b.velocities, epsilon = 1e-5);
}

// ============================================================================
// Batch shapes and selection
// ============================================================================

/// Test: one sample is not squeezed into a vector.
#[test]
fn test_single_sample_keeps_matrix_shape() {
    let mut model = Model::new(NumericSkeleton::planar_arm());
    let (poses, velocities, excitation) = arm_batch(1);

    let kinematics = model
        .muscles_kinematics(&poses, Some(&velocities), 2..5)
        .expect("kinematics");
    assert_eq!(kinematics.lengths.shape(), (3, 1));

    let coefficients = model
        .muscle_force_coefficients(&excitation, &poses, Some(&velocities), 2..5)
        .expect("coefficients");
    assert_eq!(coefficients.passive.shape(), (3, 1));
    assert_eq!(coefficients.active.shape(), (3, 1));
    assert_eq!(coefficients.velocity.map(|v| v.shape()), Some((3, 1)));
}

/// Restrict the rows of a full-range batch to `range`.
fn restrict(full: &Samples, range: std::ops::Range<usize>) -> DMatrix<f64> {
    let full = full.materialize().expect("numeric");
    full.rows(range.start, range.len()).into_owned()
}

proptest! {
    /// Test: every batch output is `n_selected × K`, and a sub-range equals
    /// the matching rows of the full range.
    #[test]
    fn prop_batch_shapes_and_sub_ranges(k in 1usize..6, start in 0usize..5, len in 1usize..5) {
        let end = (start + len).min(5);
        let mut model = Model::new(NumericSkeleton::planar_arm());
        let (poses, velocities, excitation) = arm_batch(k);

        let full_kin = model
            .muscles_kinematics(&poses, Some(&velocities), ..)
            .expect("kinematics");
        let part_kin = model
            .muscles_kinematics(&poses, Some(&velocities), start..end)
            .expect("kinematics");
        prop_assert_eq!(part_kin.lengths.shape(), (end - start, k));
        let lengths = part_kin.lengths.materialize().expect("numeric");
        prop_assert!(lengths == restrict(&full_kin.lengths, start..end));

        let full_coef = model
            .muscle_force_coefficients(&excitation, &poses, Some(&velocities), ..)
            .expect("coefficients");
        let part_coef = model
            .muscle_force_coefficients(&excitation, &poses, Some(&velocities), start..end)
            .expect("coefficients");
        prop_assert_eq!(part_coef.active.shape(), (end - start, k));
        let active = part_coef.active.materialize().expect("numeric");
        prop_assert!(active == restrict(&full_coef.active, start..end));

        let full_force = model
            .muscle_force(&excitation, &poses, &velocities, MuscleSelection::All)
            .expect("force");
        let part_force = model
            .muscle_force(&excitation, &poses, &velocities, start..end)
            .expect("force");
        let force = part_force.materialize().expect("numeric");
        prop_assert!(force == restrict(&full_force, start..end));
    }
}
