//! Symbolic models evaluate to the numeric results.
//!
//! Expression graphs built by a [`SymbolicSkeleton`] are bound to the same
//! values fed to a [`NumericSkeleton`] and compared.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use sim_core::{NumericSkeleton, SymbolicSkeleton};
use sim_musculoskeletal::{Control, ExcitationWiring, Model, MuscleParameter};
use sim_types::{Bindings, Evaluable, Expr, Representation, Samples};

const POSE: [f64; 2] = [0.35, 1.1];
const VELOCITY: [f64; 2] = [-0.4, 0.25];
const EXCITATION: [f64; 5] = [0.15, 0.6, 0.9, 0.4, 0.05];

struct Symbols {
    q: Vec<Expr>,
    qdot: Vec<Expr>,
    e: Vec<Expr>,
}

impl Symbols {
    fn new() -> Self {
        Self {
            q: Expr::symbols("q", 2),
            qdot: Expr::symbols("qdot", 2),
            e: Expr::symbols("e", 5),
        }
    }

    fn bindings(&self) -> Bindings {
        Bindings::new()
            .bind_all(&self.q, &POSE)
            .bind_all(&self.qdot, &VELOCITY)
            .bind_all(&self.e, &EXCITATION)
    }
}

fn assert_graph_matches(graph: &Samples, expected: &Samples, bindings: &Bindings) {
    let graph = graph.as_symbolic().expect("symbolic output");
    let expected = expected.materialize().expect("numeric output");
    assert_eq!(graph.shape(), expected.shape());
    for (node, value) in graph.iter().zip(expected.iter()) {
        assert_relative_eq!(node.evaluate_with(bindings).expect("bound"), *value, epsilon = 1e-9);
    }
}

// ============================================================================
// Batch queries
// ============================================================================

/// Test: muscle lengths, velocities and force coefficients.
#[test]
fn test_batch_queries_match_numeric() {
    let symbols = Symbols::new();
    let bindings = symbols.bindings();
    let mut numeric = Model::new(NumericSkeleton::planar_arm());
    let mut symbolic = Model::new(SymbolicSkeleton::planar_arm());

    let (q, qdot) = (Samples::numeric_vector(&POSE), Samples::numeric_vector(&VELOCITY));
    let e = Samples::numeric_vector(&EXCITATION);
    let (sq, sqdot) = (
        Samples::symbolic_vector(&symbols.q),
        Samples::symbolic_vector(&symbols.qdot),
    );
    let se = Samples::symbolic_vector(&symbols.e);

    let expected = numeric.muscles_kinematics(&q, Some(&qdot), ..).expect("numeric");
    let graph = symbolic
        .muscles_kinematics(&sq, Some(&sqdot), ..)
        .expect("symbolic");
    assert_graph_matches(&graph.lengths, &expected.lengths, &bindings);
    assert_graph_matches(
        graph.velocities.as_ref().expect("velocities"),
        expected.velocities.as_ref().expect("velocities"),
        &bindings,
    );

    let expected = numeric
        .muscle_force_coefficients(&e, &q, Some(&qdot), 1..4)
        .expect("numeric");
    let graph = symbolic
        .muscle_force_coefficients(&se, &sq, Some(&sqdot), 1..4)
        .expect("symbolic");
    assert_eq!(graph.active.representation(), Representation::Symbolic);
    assert_graph_matches(&graph.passive, &expected.passive, &bindings);
    assert_graph_matches(&graph.active, &expected.active, &bindings);

    let expected = numeric.muscle_force(&e, &q, &qdot, ..).expect("numeric");
    let graph = symbolic.muscle_force(&se, &sq, &sqdot, ..).expect("symbolic");
    assert_graph_matches(&graph, &expected, &bindings);
}

/// Test: several symbolic samples in one batch.
#[test]
fn test_symbolic_batch_columns_are_independent() {
    let mut symbolic = Model::new(SymbolicSkeleton::planar_arm());
    let mut numeric = Model::new(NumericSkeleton::planar_arm());
    let values = DMatrix::from_row_slice(2, 3, &[0.1, 0.5, 0.9, 0.2, 0.4, 1.2]);
    let names = DMatrix::from_fn(2, 3, |r, c| Expr::symbol(format!("q_{r}_{c}")));

    let mut bindings = Bindings::new();
    for (name, value) in names.iter().zip(values.iter()) {
        bindings.insert(name, *value);
    }
    let expected = numeric
        .muscles_kinematics(&Samples::Numeric(values), None, ..)
        .expect("numeric");
    let graph = symbolic
        .muscles_kinematics(&Samples::Symbolic(names), None, ..)
        .expect("symbolic");
    assert!(graph.velocities.is_none());
    assert_graph_matches(&graph.lengths, &expected.lengths, &bindings);
}

// ============================================================================
// Dynamics
// ============================================================================

/// Test: torque-driven forward dynamics.
#[test]
fn test_torque_dynamics_match_numeric() {
    let symbols = Symbols::new();
    let tau = Expr::symbols("tau", 2);
    let bindings = symbols.bindings().bind_all(&tau, &[1.5, -0.7]);

    let mut numeric = Model::new(NumericSkeleton::planar_arm());
    let mut symbolic = Model::new(SymbolicSkeleton::planar_arm());
    let (_, expected) = numeric
        .forward_dynamics(&POSE, &VELOCITY, &Control::Torque(DVector::from_vec(vec![1.5, -0.7])))
        .expect("numeric");
    let (qdot, qddot) = symbolic
        .forward_dynamics(&symbols.q, &symbols.qdot, &Control::Torque(DVector::from_vec(tau)))
        .expect("symbolic");

    for i in 0..2 {
        assert_eq!(qdot[i], symbols.qdot[i]);
        assert!(qddot[i].known_value().is_none());
        assert_relative_eq!(
            qddot[i].evaluate_with(&bindings).expect("bound"),
            expected[i],
            epsilon = 1e-8
        );
    }
}

/// Test: the derivative function stacks `[q̇, q̈]` symbolically.
#[test]
fn test_symbolic_derivative_with_direct_excitation() {
    let symbols = Symbols::new();
    let bindings = symbols.bindings();
    let mut numeric =
        Model::new(NumericSkeleton::planar_arm()).with_wiring(ExcitationWiring::Direct);
    let mut symbolic =
        Model::new(SymbolicSkeleton::planar_arm()).with_wiring(ExcitationWiring::Direct);

    let state: Vec<f64> = POSE.iter().chain(&VELOCITY).copied().collect();
    let expected = numeric
        .dynamics()
        .derivative(0.0, &state, &Control::Excitation(DVector::from_column_slice(&EXCITATION)))
        .expect("numeric");

    let symbolic_state: Vec<Expr> = symbols.q.iter().chain(&symbols.qdot).cloned().collect();
    let graph = symbolic
        .dynamics()
        .derivative(
            0.0,
            &symbolic_state,
            &Control::Excitation(DVector::from_vec(symbols.e.clone())),
        )
        .expect("symbolic");

    assert_eq!(graph.len(), 4);
    for (node, value) in graph.iter().zip(expected.iter()) {
        assert_relative_eq!(node.evaluate_with(&bindings).expect("bound"), *value, epsilon = 1e-8);
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Test: parameter changes flow into later symbolic graphs.
#[test]
fn test_parameter_change_reaches_symbolic_graph() {
    let symbols = Symbols::new();
    let bindings = symbols.bindings();
    let mut symbolic = Model::new(SymbolicSkeleton::planar_arm());
    let q = Samples::symbolic_vector(&symbols.q);
    let e = Samples::symbolic_vector(&symbols.e);

    let before = symbolic
        .muscle_force_coefficients(&e, &q, None, 2)
        .expect("symbolic");
    symbolic
        .set_muscle_parameter(2, MuscleParameter::OptimalLength, 0.14)
        .expect("set");
    assert_eq!(
        symbolic
            .get_muscle_parameter(2, MuscleParameter::OptimalLength)
            .expect("get"),
        0.14
    );
    let after = symbolic
        .muscle_force_coefficients(&e, &q, None, 2)
        .expect("symbolic");

    let value = |s: &Samples| {
        s.as_symbolic().expect("symbolic")[(0, 0)]
            .evaluate_with(&bindings)
            .expect("bound")
    };
    assert!((value(&before.active) - value(&after.active)).abs() > 1e-6);
}
