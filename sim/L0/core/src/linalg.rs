//! Dense Cholesky factorization over any [`Evaluable`] scalar.
//!
//! Positivity of a pivot can only be checked when its value is known. For
//! symbolic matrices with free variables the check is deferred to evaluation
//! time, where a non-positive pivot shows up as a NaN from `sqrt`.

use nalgebra::{DMatrix, DVector};
use sim_types::Evaluable;

use crate::error::{EngineError, Result};

/// In-place Cholesky (LL^T) factorization. Overwrites the lower triangle of `m` with L.
/// The upper triangle is left unchanged.
///
/// Returns [`EngineError::SingularMassMatrix`] if a known pivot is not positive.
pub fn cholesky_in_place<S: Evaluable>(m: &mut DMatrix<S>) -> Result<()> {
    let n = m.nrows();
    for j in 0..n {
        // L[j,j] = sqrt(M[j,j] - Σ L[j,k]²)
        let mut diag = m[(j, j)].clone();
        for k in 0..j {
            diag = diag - m[(j, k)].clone() * m[(j, k)].clone();
        }
        if diag
            .known_value()
            .is_some_and(|d| d.is_nan() || d <= 0.0)
        {
            return Err(EngineError::SingularMassMatrix);
        }
        let ljj = diag.sqrt();
        m[(j, j)] = ljj.clone();

        // L[i,j] = (M[i,j] - Σ L[i,k]·L[j,k]) / L[j,j]
        for i in (j + 1)..n {
            let mut sum = m[(i, j)].clone();
            for k in 0..j {
                sum = sum - m[(i, k)].clone() * m[(j, k)].clone();
            }
            m[(i, j)] = sum / ljj.clone();
        }
    }
    Ok(())
}

/// Solve L·L^T·x = b in place, where L is stored in the lower triangle of `l`.
/// On entry `x` contains b; on exit `x` contains the solution.
pub fn cholesky_solve_in_place<S: Evaluable>(l: &DMatrix<S>, x: &mut DVector<S>) {
    let n = l.nrows();

    // L·y = b
    for j in 0..n {
        for k in 0..j {
            x[j] = x[j].clone() - l[(j, k)].clone() * x[k].clone();
        }
        x[j] = x[j].clone() / l[(j, j)].clone();
    }

    // L^T·z = y
    for j in (0..n).rev() {
        for k in (j + 1)..n {
            x[j] = x[j].clone() - l[(k, j)].clone() * x[k].clone();
        }
        x[j] = x[j].clone() / l[(j, j)].clone();
    }
}
