//! Control inputs: joint torques or muscle excitations.
//!
//! A control is tagged by its kind once, at the call boundary, and every
//! consumer matches exhaustively on the tag:
//!
//! | kind | length | reaches the engine as |
//! |------|--------|-----------------------|
//! | [`Control::Torque`] | `n_q` | torque passed to forward dynamics |
//! | [`Control::Excitation`] | `n_muscles` | muscle-induced joint torque |

use std::fmt;
use std::str::FromStr;

use nalgebra::DVector;

use crate::error::{MusculoskeletalError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a control vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ControlKind {
    /// Joint torques, one per generalized coordinate.
    Torque,
    /// Muscle excitations, one per muscle.
    Excitation,
}

impl ControlKind {
    /// Required vector length for a model of the given size.
    #[must_use]
    pub fn expected_len(self, n_q: usize, n_muscles: usize) -> usize {
        match self {
            Self::Torque => n_q,
            Self::Excitation => n_muscles,
        }
    }

    /// Name used in dimension errors.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Torque => "torque control",
            Self::Excitation => "excitation control",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Torque => write!(f, "torque"),
            Self::Excitation => write!(f, "excitation"),
        }
    }
}

impl FromStr for ControlKind {
    type Err = MusculoskeletalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "torque" => Ok(Self::Torque),
            "emg" | "excitation" => Ok(Self::Excitation),
            _ => Err(MusculoskeletalError::UnsupportedControlType { name: s.to_string() }),
        }
    }
}

/// A control vector tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Control<V> {
    /// Joint torques.
    Torque(V),
    /// Muscle excitations.
    Excitation(V),
}

impl<V> Control<V> {
    /// Tag `values` with `kind`.
    pub fn from_kind(kind: ControlKind, values: V) -> Self {
        match kind {
            ControlKind::Torque => Self::Torque(values),
            ControlKind::Excitation => Self::Excitation(values),
        }
    }

    /// The kind tag.
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Torque(_) => ControlKind::Torque,
            Self::Excitation(_) => ControlKind::Excitation,
        }
    }

    /// The untagged values.
    pub fn values(&self) -> &V {
        match self {
            Self::Torque(v) | Self::Excitation(v) => v,
        }
    }

    /// Apply `f` to the values, keeping the tag.
    pub fn map<W>(self, f: impl FnOnce(V) -> W) -> Control<W> {
        match self {
            Self::Torque(v) => Control::Torque(f(v)),
            Self::Excitation(v) => Control::Excitation(f(v)),
        }
    }
}

/// How excitation controls reach the engine's muscle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExcitationWiring {
    /// Use the engine's stored muscle states; excitation values are checked
    /// but otherwise ignored.
    #[default]
    ModelState,
    /// Each muscle gets the state pair `(e, e)` from its excitation.
    Direct,
}

/// Time-varying control signal.
pub type ControlSchedule = Box<dyn Fn(f64) -> DVector<f64>>;

/// Control supplied to trajectory integration.
pub enum ControlInput {
    /// The same control at every time.
    Constant(Control<DVector<f64>>),
    /// A control vector computed from time, with a fixed kind.
    Schedule {
        /// Kind of every produced vector.
        kind: ControlKind,
        /// `t -> control values`.
        schedule: ControlSchedule,
    },
}

impl ControlInput {
    /// A constant control.
    #[must_use]
    pub fn constant(control: Control<DVector<f64>>) -> Self {
        Self::Constant(control)
    }

    /// Zero torque for `n_q` coordinates.
    #[must_use]
    pub fn zero_torque(n_q: usize) -> Self {
        Self::Constant(Control::Torque(DVector::zeros(n_q)))
    }

    /// A schedule of the given kind.
    pub fn schedule(kind: ControlKind, f: impl Fn(f64) -> DVector<f64> + 'static) -> Self {
        Self::Schedule {
            kind,
            schedule: Box::new(f),
        }
    }

    /// Kind of the produced controls.
    #[must_use]
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Constant(control) => control.kind(),
            Self::Schedule { kind, .. } => *kind,
        }
    }

    /// The control at time `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Control<DVector<f64>> {
        match self {
            Self::Constant(control) => control.clone(),
            Self::Schedule { kind, schedule } => Control::from_kind(*kind, schedule(t)),
        }
    }
}

impl From<Control<DVector<f64>>> for ControlInput {
    fn from(control: Control<DVector<f64>>) -> Self {
        Self::Constant(control)
    }
}

impl fmt::Debug for ControlInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(control) => f.debug_tuple("Constant").field(control).finish(),
            Self::Schedule { kind, .. } => f
                .debug_struct("Schedule")
                .field("kind", kind)
                .finish_non_exhaustive(),
        }
    }
}
