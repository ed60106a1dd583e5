//! Muscle activation state.
//!
//! Force queries take the pair (excitation, activation):
//!
//! ```text
//! excitation u  : the neural command, the control input
//! activation a  : the contractile state that scales active force
//! ```
//!
//! The two coincide when activation dynamics are neglected, which is how
//! excitation samples are turned into states for force-coefficient queries.

use sim_types::Evaluable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Excitation/activation pair for one muscle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActivationState<S = f64> {
    /// Neural excitation (target activation), nominally in [0, 1].
    pub excitation: S,
    /// Current activation, nominally in [0, 1].
    pub activation: S,
}

impl<S: Evaluable> ActivationState<S> {
    /// Create a state from an explicit (excitation, activation) pair.
    #[must_use]
    pub fn new(excitation: S, activation: S) -> Self {
        Self {
            excitation,
            activation,
        }
    }

    /// A state whose activation equals its excitation.
    #[must_use]
    pub fn from_excitation(excitation: S) -> Self {
        Self {
            activation: excitation.clone(),
            excitation,
        }
    }

    /// A fully relaxed muscle.
    #[must_use]
    pub fn relaxed() -> Self {
        Self::new(S::zero(), S::zero())
    }

    /// Get the activation level.
    #[must_use]
    pub fn activation(&self) -> &S {
        &self.activation
    }
}

impl<S: Evaluable> Default for ActivationState<S> {
    fn default() -> Self {
        Self::relaxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_types::Expr;

    #[test]
    fn test_from_excitation_copies_value() {
        let s = ActivationState::from_excitation(0.4);
        assert_eq!(s.excitation, 0.4);
        assert_eq!(s.activation, 0.4);
    }

    #[test]
    fn test_default_is_relaxed() {
        let s: ActivationState<f64> = ActivationState::default();
        assert_eq!(s, ActivationState::new(0.0, 0.0));
    }

    #[test]
    fn test_symbolic_state_shares_node() {
        let e = Expr::symbol("e");
        let s = ActivationState::from_excitation(e.clone());
        assert_eq!(s.activation, e);
        assert_eq!(s.excitation, e);
    }
}
