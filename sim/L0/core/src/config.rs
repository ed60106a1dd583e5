//! Configuration for planar musculoskeletal chains.
//!
//! A [`SkeletonConfig`] is plain data: links, muscles, gravity. It is built in
//! code through presets and `with_*` builders, or deserialized by the caller
//! when the `serde` feature is enabled.

use sim_muscle::{
    MuscleCharacteristics, MuscleDescriptor, MuscleKind, MusclePath, PolynomialMomentArm,
};

use crate::error::{EngineError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One rigid link of a planar serial chain, hinged at its proximal end.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Link name.
    pub name: String,
    /// Distance from this joint to the next (m).
    pub length: f64,
    /// Link mass (kg).
    pub mass: f64,
    /// Distance from the joint to the center of mass along the link (m).
    pub com: f64,
    /// Rotational inertia about the center of mass (kg·m²).
    pub inertia: f64,
}

impl LinkConfig {
    /// A uniform slender rod.
    #[must_use]
    pub fn rod(name: impl Into<String>, length: f64, mass: f64) -> Self {
        Self {
            name: name.into(),
            length,
            mass,
            com: 0.5 * length,
            inertia: mass * length * length / 12.0,
        }
    }

    /// A point mass at the distal end of the link.
    #[must_use]
    pub fn point_mass(name: impl Into<String>, length: f64, mass: f64) -> Self {
        Self {
            name: name.into(),
            length,
            mass,
            com: length,
            inertia: 1e-3 * mass * length * length,
        }
    }

    /// Set the center of mass distance.
    #[must_use]
    pub fn with_com(mut self, com: f64) -> Self {
        self.com = com;
        self
    }

    /// Set the inertia about the center of mass.
    #[must_use]
    pub fn with_inertia(mut self, inertia: f64) -> Self {
        self.inertia = inertia;
        self
    }
}

/// A planar chain of revolute joints in a vertical plane with muscles.
///
/// Each joint angle is measured from the parent link direction; with every
/// angle at zero the chain hangs straight down.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkeletonConfig {
    /// Model name.
    pub name: String,
    /// Gravitational acceleration along -y (m/s²).
    pub gravity: f64,
    /// Links from the base outward; one generalized coordinate each.
    pub links: Vec<LinkConfig>,
    /// Muscles acting on the chain.
    pub muscles: Vec<MuscleDescriptor>,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            name: "skeleton".to_string(),
            gravity: 9.81,
            links: Vec::new(),
            muscles: Vec::new(),
        }
    }
}

impl SkeletonConfig {
    /// An empty skeleton with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Chain of `n` links with point masses at their tips and no muscles.
    #[must_use]
    pub fn n_link_pendulum(n: usize, link_length: f64, link_mass: f64) -> Self {
        (0..n).fold(Self::new(format!("pendulum_{n}")), |config, i| {
            config.with_link(LinkConfig::point_mass(
                format!("link_{i}"),
                link_length,
                link_mass,
            ))
        })
    }

    /// One forearm-like rod driven by a single idealized flexor.
    ///
    /// At rest (zero pose, zero velocity, relaxed muscle) the rod hangs
    /// straight down and every acceleration is zero.
    #[must_use]
    pub fn single_joint_flexor() -> Self {
        let characteristics = MuscleCharacteristics::biceps();
        let reference = characteristics.optimal_musculotendon_length();
        Self::new("single_joint_flexor")
            .with_link(LinkConfig::rod("forearm", 0.30, 1.5))
            .with_muscle(
                MuscleDescriptor::new("flexor", MuscleKind::IdealizedActuator, characteristics)
                    .with_path(
                        MusclePath::new(reference).with_span(0, PolynomialMomentArm::constant(0.04)),
                    ),
            )
    }

    /// Two-segment arm (shoulder, elbow) with five muscles of mixed kinds.
    ///
    /// Muscle order: shoulder flexor, shoulder extensor, biarticular flexor,
    /// elbow flexor, elbow extensor.
    #[must_use]
    pub fn planar_arm() -> Self {
        let muscle = |name: &str, kind, characteristics: MuscleCharacteristics, path| {
            MuscleDescriptor::new(name, kind, characteristics).with_path(path)
        };
        let at_optimal = |c: &MuscleCharacteristics| c.optimal_musculotendon_length();

        let deltoid_anterior = MuscleCharacteristics::default()
            .with_max_isometric_force(1100.0)
            .with_optimal_length(0.098)
            .with_tendon_slack_length(0.093)
            .with_pennation_angle(0.384);
        let deltoid_posterior = MuscleCharacteristics::default()
            .with_max_isometric_force(950.0)
            .with_optimal_length(0.137)
            .with_tendon_slack_length(0.038)
            .with_pennation_angle(0.314);
        let biceps = MuscleCharacteristics::biceps();
        let brachialis = MuscleCharacteristics::default()
            .with_max_isometric_force(990.0)
            .with_optimal_length(0.086)
            .with_tendon_slack_length(0.054);
        let triceps = MuscleCharacteristics::triceps();

        Self::new("planar_arm")
            .with_link(LinkConfig::rod("upper_arm", 0.30, 2.0))
            .with_link(LinkConfig::rod("forearm", 0.25, 1.5))
            .with_muscle(muscle(
                "deltoid_anterior",
                MuscleKind::HillThelen,
                deltoid_anterior.clone(),
                MusclePath::new(at_optimal(&deltoid_anterior))
                    .with_span(0, PolynomialMomentArm::linear(0.02, 0.004)),
            ))
            .with_muscle(muscle(
                "deltoid_posterior",
                MuscleKind::HillDeGroote,
                deltoid_posterior.clone(),
                MusclePath::new(at_optimal(&deltoid_posterior))
                    .with_span(0, PolynomialMomentArm::linear(-0.02, 0.003)),
            ))
            .with_muscle(muscle(
                "biceps",
                MuscleKind::Hill,
                biceps.clone(),
                MusclePath::new(at_optimal(&biceps))
                    .with_span(0, PolynomialMomentArm::constant(0.015))
                    .with_span(1, PolynomialMomentArm::quadratic(0.02, 0.015, -0.005)),
            ))
            .with_muscle(muscle(
                "brachialis",
                MuscleKind::HillThelen,
                brachialis.clone(),
                MusclePath::new(at_optimal(&brachialis))
                    .with_span(1, PolynomialMomentArm::quadratic(0.015, 0.012, -0.004)),
            ))
            .with_muscle(muscle(
                "triceps",
                MuscleKind::IdealizedActuator,
                triceps.clone(),
                MusclePath::new(at_optimal(&triceps))
                    .with_span(1, PolynomialMomentArm::constant(-0.021)),
            ))
    }

    /// Append a link (and its generalized coordinate).
    #[must_use]
    pub fn with_link(mut self, link: LinkConfig) -> Self {
        self.links.push(link);
        self
    }

    /// Append a muscle.
    #[must_use]
    pub fn with_muscle(mut self, muscle: MuscleDescriptor) -> Self {
        self.muscles.push(muscle);
        self
    }

    /// Set gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Number of generalized coordinates.
    #[must_use]
    pub fn n_q(&self) -> usize {
        self.links.len()
    }

    /// Check that the configuration describes a simulable chain.
    pub fn validate(&self) -> Result<()> {
        if self.links.is_empty() {
            return Err(EngineError::invalid_config("skeleton has no links"));
        }
        if !self.gravity.is_finite() {
            return Err(EngineError::invalid_config("gravity must be finite"));
        }
        for link in &self.links {
            let finite = [link.length, link.com, link.inertia, link.mass]
                .iter()
                .all(|x| x.is_finite());
            if !finite || link.mass <= 0.0 || link.inertia < 0.0 || link.length < 0.0 {
                return Err(EngineError::invalid_config(format!(
                    "link '{}' has invalid mass properties",
                    link.name
                )));
            }
        }
        for muscle in &self.muscles {
            if !muscle.characteristics.is_valid() {
                return Err(EngineError::invalid_config(format!(
                    "muscle '{}' has invalid characteristics",
                    muscle.name
                )));
            }
            if muscle.path.max_joint().is_some_and(|j| j >= self.n_q()) {
                return Err(EngineError::invalid_config(format!(
                    "muscle '{}' crosses a joint beyond the {} coordinates",
                    muscle.name,
                    self.n_q()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(SkeletonConfig::n_link_pendulum(3, 1.0, 0.1).validate().is_ok());
        assert!(SkeletonConfig::single_joint_flexor().validate().is_ok());
        let arm = SkeletonConfig::planar_arm();
        assert!(arm.validate().is_ok());
        assert_eq!(arm.n_q(), 2);
        assert_eq!(arm.muscles.len(), 5);
    }

    #[test]
    fn test_rejects_muscle_beyond_chain() {
        let config = SkeletonConfig::single_joint_flexor().with_muscle(
            MuscleDescriptor::new("stray", MuscleKind::Hill, MuscleCharacteristics::default())
                .with_path(MusclePath::new(0.3).with_span(1, PolynomialMomentArm::constant(0.01))),
        );
        assert!(config.validate().is_err_and(|e| e.is_config_error()));
    }

    #[test]
    fn test_rejects_empty_and_massless() {
        assert!(SkeletonConfig::new("empty").validate().is_err());
        let massless = SkeletonConfig::new("m").with_link(LinkConfig::rod("l", 1.0, 0.0));
        assert!(massless.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde_roundtrip() {
        let config = SkeletonConfig::planar_arm();
        let json = serde_json::to_string(&config).unwrap_or_default();
        let parsed: Option<SkeletonConfig> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(config));
    }
}
