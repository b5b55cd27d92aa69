//! Native direct solver using nalgebra.
//!
//! The global matrix is expanded to dense storage and factorized with LU.
//! Accepts non-symmetric tangents. Suitable for small-to-medium problems
//! (up to a few thousand DOFs).

use super::traits::*;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

/// Dense LU linear solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLu;

impl LinearSolver for DenseLu {
    fn solve_linear(
        &self,
        matrix: &CsrMatrix<f64>,
        rhs: &DVector<f64>,
    ) -> Result<(DVector<f64>, SolveInfo), BackendError> {
        check_dimensions(matrix, rhs)?;
        let n = matrix.nrows();

        let mut k = DMatrix::zeros(n, n);
        for (r, c, v) in matrix.triplet_iter() {
            k[(r, c)] += *v;
        }

        let x = k
            .lu()
            .solve(rhs)
            .ok_or(BackendError("Singular matrix in LU decomposition".into()))?;

        Ok((
            x,
            SolveInfo {
                iterations: 1,
                residual_norm: None,
                solver_name: "nalgebra-LU".to_string(),
            },
        ))
    }
}
