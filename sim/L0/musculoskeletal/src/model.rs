//! The model handle every musculoskeletal operation runs against.

use sim_core::MusculoskeletalEngine;

use crate::control::ExcitationWiring;
use crate::integrate::IntegratorConfig;

/// A musculoskeletal model: an engine plus the settings that steer how the
/// core drives it.
///
/// Queries refresh the engine's kinematic cache in place, so every operation
/// that touches the engine takes `&mut self`. One model serves one caller at
/// a time; run independent models for parallel work.
#[derive(Debug, Clone)]
pub struct Model<E> {
    engine: E,
    wiring: ExcitationWiring,
    integrator: IntegratorConfig,
}

impl<E: MusculoskeletalEngine> Model<E> {
    /// Wrap an engine with default settings.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            wiring: ExcitationWiring::default(),
            integrator: IntegratorConfig::default(),
        }
    }

    /// Choose how excitation controls reach the engine.
    #[must_use]
    pub fn with_wiring(mut self, wiring: ExcitationWiring) -> Self {
        self.wiring = wiring;
        self
    }

    /// Set the integrator configuration used by [`Model::integrate`].
    #[must_use]
    pub fn with_integrator(mut self, config: IntegratorConfig) -> Self {
        self.integrator = config;
        self
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the wrapped engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Unwrap the engine.
    #[must_use]
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.engine.name()
    }

    /// Number of generalized coordinates.
    #[must_use]
    pub fn n_q(&self) -> usize {
        self.engine.n_q()
    }

    /// Number of muscles.
    #[must_use]
    pub fn n_muscles(&self) -> usize {
        self.engine.n_muscles()
    }

    /// How excitation controls reach the engine.
    #[must_use]
    pub fn wiring(&self) -> ExcitationWiring {
        self.wiring
    }

    /// The integrator configuration.
    #[must_use]
    pub fn integrator_config(&self) -> &IntegratorConfig {
        &self.integrator
    }
}
