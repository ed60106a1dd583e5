//! Invalid requests are rejected before the engine is touched.
//!
//! Every test drives a [`SpyEngine`] and checks both the error and that no
//! state-touching engine call was recorded.

use nalgebra::{DMatrix, DVector};
use sim_conformance_tests::SpyEngine;
use sim_core::{EngineError, LinkConfig, MusculoskeletalEngine, NumericSkeleton, SkeletonConfig};
use sim_muscle::{MuscleCharacteristics, MuscleDescriptor, MuscleKind, MusclePath, PolynomialMomentArm};
use sim_musculoskeletal::{
    Control, ControlInput, ControlKind, IntegrationMethod, IntegratorConfig, Model,
    MusculoskeletalError, MuscleParameter,
};
use sim_types::{Expr, Representation, Samples};

fn spy_arm() -> Model<SpyEngine> {
    Model::new(SpyEngine::planar_arm())
}

fn characteristics(model: &Model<SpyEngine>, index: usize) -> MuscleCharacteristics {
    model
        .engine()
        .muscle(index)
        .expect("muscle index")
        .characteristics
        .clone()
}

fn assert_untouched(model: &Model<SpyEngine>) {
    assert_eq!(model.engine().log().total(), 0, "engine was called: {:?}", model.engine().log());
}

// ============================================================================
// Control dimensions
// ============================================================================

/// Test: a 4-vector torque on a 3-DoF model fails with no engine call.
#[test]
fn test_wrong_torque_length_on_three_links() {
    let mut model = Model::new(SpyEngine::three_link().expect("three link"));
    assert_eq!(model.n_q(), 3);

    let err = model
        .forward_dynamics(&[0.0; 3], &[0.0; 3], &Control::Torque(DVector::zeros(4)))
        .unwrap_err();
    assert_eq!(err, MusculoskeletalError::dimension("torque control", 3, 4));
    assert_untouched(&model);
}

/// Test: excitation length must equal the muscle count.
#[test]
fn test_wrong_excitation_length() {
    let mut model = spy_arm();
    let err = model
        .forward_dynamics(&[0.0; 2], &[0.0; 2], &Control::Excitation(DVector::zeros(2)))
        .unwrap_err();
    assert_eq!(err, MusculoskeletalError::dimension("excitation control", 5, 2));
    assert_untouched(&model);
}

/// Test: a schedule returning the wrong length stops integration at the
/// first evaluation.
#[test]
fn test_schedule_with_wrong_length_aborts_integration() {
    let mut model = spy_arm();
    let control = ControlInput::schedule(ControlKind::Torque, |_| DVector::zeros(3));
    let err = model
        .integrate(&[0.0, 0.1], &[0.0; 4], &control, IntegrationMethod::Rk45)
        .unwrap_err();
    assert!(err.is_dimension_mismatch());
    assert_untouched(&model);
}

/// Test: the initial state must hold pose and velocity.
#[test]
fn test_initial_state_length() {
    let mut model = spy_arm();
    let err = model
        .integrate(&[0.0, 0.1], &[0.0; 3], &ControlInput::zero_torque(2), IntegrationMethod::Rk4)
        .unwrap_err();
    assert_eq!(err, MusculoskeletalError::dimension("initial state", 4, 3));
    assert_untouched(&model);
}

// ============================================================================
// Time samples and configuration
// ============================================================================

/// Test: empty, repeated, decreasing and non-finite sample times.
#[test]
fn test_invalid_time_samples() {
    let cases: [&[f64]; 4] = [&[], &[0.0, 0.1, 0.1], &[0.2, 0.1], &[0.0, f64::NAN]];
    for t in cases {
        let mut model = spy_arm();
        let err = model
            .integrate(t, &[0.0; 4], &ControlInput::zero_torque(2), IntegrationMethod::Rk45)
            .unwrap_err();
        assert!(
            matches!(err, MusculoskeletalError::InvalidTimeSamples { .. }),
            "{t:?} gave {err}"
        );
        assert_untouched(&model);
    }
}

/// Test: unusable tolerances are rejected up front, including a zero
/// absolute tolerance on a state that starts at rest.
#[test]
fn test_invalid_integrator_config() {
    let configs = [
        IntegratorConfig::default().with_rtol(0.0),
        IntegratorConfig::default().with_atol(0.0),
    ];
    for config in configs {
        let mut model = spy_arm().with_integrator(config);
        let err = model
            .integrate(&[0.0, 0.1], &[0.0; 4], &ControlInput::zero_torque(2), IntegrationMethod::Rk45)
            .unwrap_err();
        assert!(matches!(err, MusculoskeletalError::InvalidConfig { .. }), "{err}");
        assert_untouched(&model);
    }
}

/// Test: unknown names do not parse into control kinds or methods.
#[test]
fn test_unknown_names() {
    assert_eq!(
        "position".parse::<ControlKind>().unwrap_err(),
        MusculoskeletalError::UnsupportedControlType {
            name: "position".to_string()
        }
    );
    assert!(matches!(
        "euler".parse::<IntegrationMethod>().unwrap_err(),
        MusculoskeletalError::UnsupportedIntegrationMethod { .. }
    ));
    assert_eq!("EMG".parse::<ControlKind>().unwrap(), ControlKind::Excitation);
    assert_eq!("rk4".parse::<IntegrationMethod>().unwrap(), IntegrationMethod::Rk4);
}

// ============================================================================
// Batch queries
// ============================================================================

/// Test: mixed numeric and symbolic inputs fail before any kinematic update.
#[test]
fn test_mixed_representations() {
    let mut model = spy_arm();
    let poses = Samples::numeric_vector(&[0.1, 0.2]);
    let velocities = Samples::symbolic_vector(&Expr::symbols("qdot", 2));
    let err = model
        .muscles_kinematics(&poses, Some(&velocities), ..)
        .unwrap_err();
    assert_eq!(
        err,
        MusculoskeletalError::TypeMismatch {
            what: "velocities",
            expected: Representation::Numeric,
            actual: Representation::Symbolic,
        }
    );

    let excitation = Samples::Symbolic(DMatrix::from_element(5, 1, Expr::constant(0.5)));
    let err = model
        .muscle_force_coefficients(&excitation, &poses, None, ..)
        .unwrap_err();
    assert!(matches!(err, MusculoskeletalError::TypeMismatch { what: "excitation", .. }));
    assert_untouched(&model);
}

/// Test: a numeric model cannot build expression graphs.
#[test]
fn test_symbolic_input_on_numeric_model() {
    let mut model = spy_arm();
    let poses = Samples::symbolic_vector(&Expr::symbols("q", 2));
    let err = model.muscles_kinematics(&poses, None, ..).unwrap_err();
    assert!(matches!(err, MusculoskeletalError::TypeMismatch { what: "poses", .. }));
    assert_untouched(&model);
}

/// Test: selection past the muscle count names the first bad index.
#[test]
fn test_selection_out_of_range() {
    let mut model = spy_arm();
    let poses = Samples::numeric_vector(&[0.1, 0.2]);
    let err = model.muscles_kinematics(&poses, None, 3..7).unwrap_err();
    assert_eq!(err, MusculoskeletalError::MuscleIndexOutOfRange { index: 6, count: 5 });
    let err = model.muscles_kinematics(&poses, None, 5).unwrap_err();
    assert_eq!(err, MusculoskeletalError::MuscleIndexOutOfRange { index: 5, count: 5 });
    assert_untouched(&model);
}

/// Test: sample counts must agree between poses and the other inputs.
#[test]
fn test_sample_count_mismatch() {
    let mut model = spy_arm();
    let poses = Samples::Numeric(DMatrix::zeros(2, 3));
    let velocities = Samples::Numeric(DMatrix::zeros(2, 2));
    let excitation = Samples::Numeric(DMatrix::zeros(5, 3));
    let err = model
        .muscle_force(&excitation, &poses, &velocities, ..)
        .unwrap_err();
    assert_eq!(err, MusculoskeletalError::dimension("velocity samples", 3, 2));
    assert_untouched(&model);
}

/// Test: a muscle type without force curves is rejected before its pose is
/// loaded into the engine.
#[test]
fn test_active_only_muscle_is_rejected() {
    let characteristics = MuscleCharacteristics::biceps();
    let reference = characteristics.optimal_musculotendon_length();
    let config = SkeletonConfig::new("active_only")
        .with_link(LinkConfig::rod("forearm", 0.30, 1.5))
        .with_muscle(
            MuscleDescriptor::new("flexor", MuscleKind::HillThelenActiveOnly, characteristics)
                .with_path(MusclePath::new(reference).with_span(0, PolynomialMomentArm::constant(0.04))),
        );
    let engine = NumericSkeleton::new(config).expect("valid config");
    let mut model = Model::new(SpyEngine::new(engine));

    let err = model.muscle_adapter(&[0.0], None, 0).unwrap_err();
    assert_eq!(
        err,
        MusculoskeletalError::UnsupportedMuscleType {
            index: 0,
            kind: MuscleKind::HillThelenActiveOnly,
        }
    );
    let poses = Samples::numeric_vector(&[0.0]);
    let excitation = Samples::numeric_vector(&[0.5]);
    assert!(model
        .muscle_force_coefficients(&excitation, &poses, None, ..)
        .is_err());
    assert_untouched(&model);
}

// ============================================================================
// Parameters
// ============================================================================

/// Test: unimplemented kinds fail on get and set and leave the muscle as it was.
#[test]
fn test_unimplemented_parameters_leave_model_unchanged() {
    let mut model = spy_arm();
    let before = characteristics(&model, 2);
    for parameter in MuscleParameter::ALL.into_iter().filter(|p| *p != MuscleParameter::OptimalLength) {
        assert_eq!(
            model.get_muscle_parameter(2, parameter).unwrap_err(),
            MusculoskeletalError::UnimplementedParameter { parameter }
        );
        assert_eq!(
            model.set_muscle_parameter(2, parameter, 1.0).unwrap_err(),
            MusculoskeletalError::UnimplementedParameter { parameter }
        );
    }
    assert_eq!(characteristics(&model, 2), before);
    assert_untouched(&model);
}

/// Test: bad indices and values never reach the engine's parameter storage.
#[test]
fn test_parameter_index_and_value_checks() {
    let mut model = spy_arm();
    let err = model
        .set_muscle_parameter(9, MuscleParameter::OptimalLength, 0.1)
        .unwrap_err();
    assert_eq!(
        err,
        MusculoskeletalError::Engine(EngineError::MuscleIndexOutOfRange { index: 9, count: 5 })
    );
    for value in [0.0, -0.1, f64::NAN, f64::INFINITY] {
        assert!(model
            .set_muscle_parameter(2, MuscleParameter::OptimalLength, value)
            .is_err());
    }
    assert_untouched(&model);

    model
        .set_muscle_parameter(2, MuscleParameter::OptimalLength, 0.12)
        .expect("valid value");
    assert_eq!(model.engine().log().characteristics_mut, 1);
    assert_eq!(
        model.get_muscle_parameter(2, MuscleParameter::OptimalLength).unwrap(),
        0.12
    );
}
