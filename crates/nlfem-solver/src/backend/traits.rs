//! Backend trait definitions for the global linear solve.
//!
//! The Newton-Raphson driver only needs one operation from a linear algebra
//! library: given the assembled tangent matrix and a residual, return the
//! displacement correction. Element-level computations stay in nalgebra
//! (small, dense matrices).

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendError(pub String);

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

impl From<&str> for BackendError {
    fn from(s: &str) -> Self {
        BackendError(s.to_string())
    }
}

/// Solver convergence and diagnostic info.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveInfo {
    /// Number of iterations (1 for direct solvers)
    pub iterations: usize,
    /// Final residual norm (if available)
    pub residual_norm: Option<f64>,
    /// Human-readable solver name (e.g., "nalgebra-LU", "jacobi-CG")
    pub solver_name: String,
}

/// Trait for a linear solver backend.
///
/// Implementations solve `K * x = r` for a square sparse `K` and a dense `r`
/// of matching dimension. Failures (singular matrix, iterative method that
/// does not converge) are reported as [`BackendError`] and are not retried
/// by the caller.
pub trait LinearSolver: Send + Sync {
    /// Solve `K * x = r` and return the solution vector.
    fn solve_linear(
        &self,
        matrix: &CsrMatrix<f64>,
        rhs: &DVector<f64>,
    ) -> Result<(DVector<f64>, SolveInfo), BackendError>;
}

/// Checks that `matrix` is square and matches the length of `rhs`.
pub(crate) fn check_dimensions(
    matrix: &CsrMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<(), BackendError> {
    if matrix.nrows() != matrix.ncols() {
        return Err(BackendError(format!(
            "Matrix must be square, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if matrix.nrows() != rhs.len() {
        return Err(BackendError(format!(
            "Right-hand side has length {} but matrix has {} rows",
            rhs.len(),
            matrix.nrows()
        )));
    }
    Ok(())
}

/// Sparse matrix-vector product `K * x`.
pub(crate) fn csr_mul(matrix: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(matrix.nrows());
    for (row_idx, row) in matrix.row_iter().enumerate() {
        y[row_idx] = row
            .col_indices()
            .iter()
            .zip(row.values().iter())
            .map(|(&col, &value)| value * x[col])
            .sum();
    }
    y
}
