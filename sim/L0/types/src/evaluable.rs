//! The scalar capability shared by numeric and symbolic backends.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::Result;
use crate::expr::Expr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a scalar or a batch of scalars is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Representation {
    /// Concrete `f64` values.
    Numeric,
    /// Nodes of a symbolic expression graph.
    Symbolic,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Symbolic => write!(f, "symbolic"),
        }
    }
}

/// A scalar that supports the arithmetic used by muscle and rigid-body code.
///
/// Arithmetic operators take operands by value. Both implementations are
/// cheap to clone (`f64` is `Copy`, [`Expr`] is reference counted).
///
/// Branches cannot be expressed with `if` on a symbolic value, so piecewise
/// curves go through [`Evaluable::select_positive`] instead.
pub trait Evaluable:
    Clone
    + fmt::Debug
    + PartialEq
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// The representation produced by this backend.
    const REPRESENTATION: Representation;

    /// Lift a constant.
    fn constant(value: f64) -> Self;

    /// Additive identity.
    fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Multiplicative identity.
    fn one() -> Self {
        Self::constant(1.0)
    }

    /// `e^self`.
    fn exp(&self) -> Self;

    /// Natural logarithm.
    fn ln(&self) -> Self;

    /// Square root.
    fn sqrt(&self) -> Self;

    /// Sine.
    fn sin(&self) -> Self;

    /// Cosine.
    fn cos(&self) -> Self;

    /// Integer power.
    fn powi(&self, n: i32) -> Self;

    /// `if_positive` when `condition > 0`, otherwise `otherwise`.
    fn select_positive(condition: &Self, if_positive: Self, otherwise: Self) -> Self;

    /// Multiply by a plain constant.
    fn scale(&self, factor: f64) -> Self {
        self.clone() * Self::constant(factor)
    }

    /// The value, if it is already known without evaluation.
    ///
    /// Always `Some` for `f64`; `Some` for an [`Expr`] only when it has been
    /// folded to a constant.
    fn known_value(&self) -> Option<f64>;

    /// Convert a symbolic expression into this representation.
    ///
    /// The numeric backend evaluates the expression, which fails on free
    /// variables.
    fn from_expr(expr: &Expr) -> Result<Self>;

    /// Convert into a symbolic expression.
    fn into_expr(self) -> Expr;

    /// Produce a concrete value, evaluating the graph if needed.
    fn materialize(&self) -> Result<f64>;
}

impl Evaluable for f64 {
    const REPRESENTATION: Representation = Representation::Numeric;

    fn constant(value: f64) -> Self {
        value
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    fn powi(&self, n: i32) -> Self {
        f64::powi(*self, n)
    }

    fn select_positive(condition: &Self, if_positive: Self, otherwise: Self) -> Self {
        if *condition > 0.0 {
            if_positive
        } else {
            otherwise
        }
    }

    fn known_value(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_expr(expr: &Expr) -> Result<Self> {
        expr.evaluate()
    }

    fn into_expr(self) -> Expr {
        Expr::constant(self)
    }

    fn materialize(&self) -> Result<f64> {
        Ok(*self)
    }
}
