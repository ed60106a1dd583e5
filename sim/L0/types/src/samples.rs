//! Batches of samples in either representation.
//!
//! A [`Samples`] matrix stores one independent sample per column. Vectors
//! are single-column matrices, so a pose passed as a vector and a batch with
//! one column behave identically.

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, SymbolicError};
use crate::evaluable::{Evaluable, Representation};
use crate::expr::Expr;

/// A column-major batch of samples, numeric or symbolic.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Concrete values.
    Numeric(DMatrix<f64>),
    /// Symbolic expressions.
    Symbolic(DMatrix<Expr>),
}

impl Samples {
    /// A single numeric column.
    #[must_use]
    pub fn numeric_vector(values: &[f64]) -> Self {
        Self::Numeric(DMatrix::from_column_slice(values.len(), 1, values))
    }

    /// A single symbolic column.
    #[must_use]
    pub fn symbolic_vector(values: &[Expr]) -> Self {
        Self::Symbolic(DMatrix::from_column_slice(values.len(), 1, values))
    }

    /// A numeric batch from a row-major nested slice (`rows[r][c]`).
    ///
    /// Every row must have the length of the first.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let ncols = rows.first().map_or(0, |r| r.len());
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(SymbolicError::RaggedRows {
                row,
                expected: ncols,
                actual: r.len(),
            });
        }
        Ok(Self::Numeric(DMatrix::from_fn(rows.len(), ncols, |r, c| {
            rows[r][c]
        })))
    }

    /// The representation of the stored values.
    #[must_use]
    pub fn representation(&self) -> Representation {
        match self {
            Self::Numeric(_) => Representation::Numeric,
            Self::Symbolic(_) => Representation::Symbolic,
        }
    }

    /// Number of rows (the per-sample dimension).
    #[must_use]
    pub fn nrows(&self) -> usize {
        match self {
            Self::Numeric(m) => m.nrows(),
            Self::Symbolic(m) => m.nrows(),
        }
    }

    /// Number of columns (the sample count).
    #[must_use]
    pub fn ncols(&self) -> usize {
        match self {
            Self::Numeric(m) => m.ncols(),
            Self::Symbolic(m) => m.ncols(),
        }
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// The numeric matrix, if numeric.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&DMatrix<f64>> {
        match self {
            Self::Numeric(m) => Some(m),
            Self::Symbolic(_) => None,
        }
    }

    /// The symbolic matrix, if symbolic.
    #[must_use]
    pub fn as_symbolic(&self) -> Option<&DMatrix<Expr>> {
        match self {
            Self::Numeric(_) => None,
            Self::Symbolic(m) => Some(m),
        }
    }

    /// Read one column in the scalar type `S`.
    ///
    /// Numeric values lift into any backend. Symbolic values convert through
    /// [`Evaluable::from_expr`], which for `f64` requires a closed graph.
    /// Out-of-range columns yield an empty vector.
    pub fn column_as<S: Evaluable>(&self, index: usize) -> Result<DVector<S>> {
        if index >= self.ncols() {
            return Ok(DVector::from_vec(Vec::new()));
        }
        match self {
            Self::Numeric(m) => Ok(DVector::from_iterator(
                m.nrows(),
                m.column(index).iter().map(|&v| S::constant(v)),
            )),
            Self::Symbolic(m) => {
                let values = m
                    .column(index)
                    .iter()
                    .map(S::from_expr)
                    .collect::<Result<Vec<S>>>()?;
                Ok(DVector::from_vec(values))
            }
        }
    }

    /// Read a single entry in the scalar type `S`.
    pub fn entry_as<S: Evaluable>(&self, row: usize, col: usize) -> Result<Option<S>> {
        match self {
            Self::Numeric(m) => Ok(m.get((row, col)).map(|&v| S::constant(v))),
            Self::Symbolic(m) => m.get((row, col)).map(S::from_expr).transpose(),
        }
    }

    /// Wrap a matrix of backend scalars in the requested representation.
    ///
    /// Requesting [`Representation::Numeric`] from symbolic scalars evaluates
    /// each entry, which fails if the graph still has free variables.
    pub fn from_scalars<S: Evaluable>(values: DMatrix<S>, target: Representation) -> Result<Self> {
        let (nrows, ncols) = values.shape();
        match target {
            Representation::Numeric => {
                let data = values
                    .iter()
                    .map(Evaluable::materialize)
                    .collect::<Result<Vec<f64>>>()?;
                Ok(Self::Numeric(DMatrix::from_vec(nrows, ncols, data)))
            }
            Representation::Symbolic => {
                let data = values.iter().cloned().map(S::into_expr).collect();
                Ok(Self::Symbolic(DMatrix::from_vec(nrows, ncols, data)))
            }
        }
    }

    /// Evaluate every entry into a numeric batch.
    pub fn materialize(&self) -> Result<DMatrix<f64>> {
        match self {
            Self::Numeric(m) => Ok(m.clone()),
            Self::Symbolic(m) => {
                let data = m.iter().map(Expr::evaluate).collect::<Result<Vec<f64>>>()?;
                Ok(DMatrix::from_vec(m.nrows(), m.ncols(), data))
            }
        }
    }
}

impl From<DMatrix<f64>> for Samples {
    fn from(m: DMatrix<f64>) -> Self {
        Self::Numeric(m)
    }
}

impl From<DVector<f64>> for Samples {
    fn from(v: DVector<f64>) -> Self {
        Self::numeric_vector(v.as_slice())
    }
}

impl From<DMatrix<Expr>> for Samples {
    fn from(m: DMatrix<Expr>) -> Self {
        Self::Symbolic(m)
    }
}

impl From<DVector<Expr>> for Samples {
    fn from(v: DVector<Expr>) -> Self {
        Self::symbolic_vector(v.as_slice())
    }
}
