//! End-to-end trajectories through the integrators.

use approx::assert_relative_eq;
use nalgebra::DVector;
use sim_core::NumericSkeleton;
use sim_musculoskeletal::{
    Control, ControlInput, ControlKind, ExcitationWiring, IntegrationMethod, IntegratorConfig,
    Model, MusculoskeletalError,
};

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Total energy of a one-link point-mass pendulum with unit length and mass.
fn pendulum_energy(q: f64, qdot: f64) -> f64 {
    let (mass, length, gravity) = (1.0, 1.0, 9.81);
    let inertia = mass * length * length * 1.001;
    0.5 * inertia * qdot * qdot - mass * gravity * length * q.cos()
}

// ============================================================================
// Passive motion
// ============================================================================

/// Test: an unactuated pendulum conserves energy under tight tolerances.
#[test]
fn test_pendulum_conserves_energy() {
    let mut model = Model::new(NumericSkeleton::n_link_pendulum(1, 1.0, 1.0))
        .with_integrator(IntegratorConfig::precise());
    let t = linspace(0.0, 3.0, 61);
    let trajectory = model
        .integrate(&t, &[1.0, 0.0], &ControlInput::zero_torque(1), IntegrationMethod::Rk45)
        .expect("integration");

    let e0 = pendulum_energy(1.0, 0.0);
    for i in 0..trajectory.len() {
        let e = pendulum_energy(trajectory.poses[(0, i)], trajectory.velocities[(0, i)]);
        assert_relative_eq!(e, e0, epsilon = 1e-6);
    }
    // swings through the bottom
    assert!(trajectory.poses.row(0).iter().any(|q| *q < 0.0));
}

/// Test: requested samples are hit exactly, whatever their spacing.
#[test]
fn test_uneven_samples_match_dense_run() {
    let config = IntegratorConfig::precise();
    let y0 = [0.6, 0.2, 0.0, -0.5];
    let control = ControlInput::zero_torque(2);

    let dense_t = linspace(0.0, 0.4, 41);
    let sparse_t = vec![0.0, 0.01, 0.13, 0.3, 0.4];
    let mut dense = Model::new(NumericSkeleton::planar_arm()).with_integrator(config.clone());
    let mut sparse = Model::new(NumericSkeleton::planar_arm()).with_integrator(config);
    let dense = dense
        .integrate(&dense_t, &y0, &control, IntegrationMethod::Rk45)
        .expect("dense");
    let sparse = sparse
        .integrate(&sparse_t, &y0, &control, IntegrationMethod::Rk45)
        .expect("sparse");

    assert_eq!(sparse.times, sparse_t);
    for (j, i) in [(0, 0), (1, 1), (2, 13), (3, 30), (4, 40)] {
        let pose = sparse.pose(j).expect("sample");
        assert_relative_eq!(pose, dense.pose(i).expect("sample"), epsilon = 1e-7);
    }
}

// ============================================================================
// Muscle-driven motion
// ============================================================================

/// Test: direct excitation flexes the joint, model-state wiring does not.
#[test]
fn test_excitation_drives_motion_only_when_wired() {
    let t = linspace(0.0, 0.2, 11);
    let control = ControlInput::constant(Control::Excitation(DVector::from_element(1, 0.5)));

    let mut direct =
        Model::new(NumericSkeleton::single_joint_flexor()).with_wiring(ExcitationWiring::Direct);
    let driven = direct
        .integrate(&t, &[0.0, 0.0], &control, IntegrationMethod::Rk45)
        .expect("direct");
    let angles: Vec<f64> = driven.poses.row(0).iter().copied().collect();
    assert!(angles.windows(2).all(|w| w[1] > w[0]), "{angles:?}");

    let mut stored = Model::new(NumericSkeleton::single_joint_flexor());
    let resting = stored
        .integrate(&t, &[0.0, 0.0], &control, IntegrationMethod::Rk45)
        .expect("model state");
    assert!(resting.poses.iter().all(|q| q.abs() < 1e-12));
    assert!(resting.velocities.iter().all(|v| v.abs() < 1e-12));
}

/// Test: a schedule returning a constant equals the constant control.
#[test]
fn test_constant_schedule_equals_constant_control() {
    let t = linspace(0.0, 0.1, 6);
    let y0 = [0.2, 0.4, 0.0, 0.0];
    let torque = DVector::from_vec(vec![0.8, -0.3]);

    let constant = ControlInput::constant(Control::Torque(torque.clone()));
    let scheduled = ControlInput::schedule(ControlKind::Torque, move |_| torque.clone());

    for method in [IntegrationMethod::Rk45, IntegrationMethod::Rk4] {
        let mut a = Model::new(NumericSkeleton::planar_arm());
        let mut b = Model::new(NumericSkeleton::planar_arm());
        let lhs = a.integrate(&t, &y0, &constant, method).expect("constant");
        let rhs = b.integrate(&t, &y0, &scheduled, method).expect("schedule");
        assert_eq!(lhs, rhs);
    }
}

/// Test: a time-varying excitation schedule on the arm integrates cleanly.
#[test]
fn test_excitation_schedule_on_arm() {
    let t = linspace(0.0, 0.3, 16);
    let schedule = ControlInput::schedule(ControlKind::Excitation, |t| {
        DVector::from_fn(5, |j, _| (0.2 + 0.1 * j as f64) * (1.0 + (10.0 * t).sin()) / 2.0)
    });
    let mut model =
        Model::new(NumericSkeleton::planar_arm()).with_wiring(ExcitationWiring::Direct);
    let trajectory = model
        .integrate(&t, &[0.3, 0.8, 0.0, 0.0], &schedule, IntegrationMethod::Rk4)
        .expect("integration");
    assert_eq!(trajectory.len(), 16);
    assert!(trajectory.poses.iter().all(|q| q.is_finite()));
}

// ============================================================================
// Step budget
// ============================================================================

/// Test: the fixed-step solver stops when it runs out of steps.
#[test]
fn test_step_budget_is_enforced() {
    let mut model = Model::new(NumericSkeleton::planar_arm()).with_integrator(
        IntegratorConfig::default()
            .with_max_step(1e-3)
            .with_max_steps(10),
    );
    let err = model
        .integrate(
            &[0.0, 0.1],
            &[0.2, 0.4, 0.0, 0.0],
            &ControlInput::zero_torque(2),
            IntegrationMethod::Rk4,
        )
        .unwrap_err();
    assert!(matches!(err, MusculoskeletalError::StepLimitExceeded { max_steps: 10, .. }));
}
