//! Jacobi-preconditioned conjugate gradient solver.
//!
//! Operates directly on the CSR matrix. Requires a symmetric positive
//! definite system, which holds for elastic and associative hardening
//! tangents once constrained rows are replaced by the identity.

use super::traits::*;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

/// Conjugate Gradient solver for symmetric positive definite systems
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    max_iterations: usize,
    tolerance: f64,
    abs_tolerance: f64,
    use_preconditioner: bool,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConjugateGradient {
    pub fn new() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-12,
            abs_tolerance: 1e-30,
            use_preconditioner: true,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_abs_tolerance(mut self, abs_tolerance: f64) -> Self {
        self.abs_tolerance = abs_tolerance;
        self
    }

    pub fn with_preconditioner(mut self, use_precond: bool) -> Self {
        self.use_preconditioner = use_precond;
        self
    }

    /// Inverse diagonal of `matrix`, or ones when preconditioning is off.
    fn inverse_diagonal(&self, matrix: &CsrMatrix<f64>) -> Result<DVector<f64>, BackendError> {
        let n = matrix.nrows();
        if !self.use_preconditioner {
            return Ok(DVector::from_element(n, 1.0));
        }
        let mut inv_diag = DVector::zeros(n);
        for (row_idx, row) in matrix.row_iter().enumerate() {
            let diag = row
                .col_indices()
                .iter()
                .position(|&col| col == row_idx)
                .map(|pos| row.values()[pos])
                .unwrap_or(0.0);
            if diag <= 0.0 {
                return Err(BackendError(format!(
                    "Non-positive diagonal entry {:.3e} at row {} (matrix not SPD?)",
                    diag, row_idx
                )));
            }
            inv_diag[row_idx] = 1.0 / diag;
        }
        Ok(inv_diag)
    }
}

impl LinearSolver for ConjugateGradient {
    fn solve_linear(
        &self,
        matrix: &CsrMatrix<f64>,
        rhs: &DVector<f64>,
    ) -> Result<(DVector<f64>, SolveInfo), BackendError> {
        check_dimensions(matrix, rhs)?;
        let n = rhs.len();
        let b_norm = rhs.norm();
        let solver_name = "jacobi-CG".to_string();

        if b_norm < self.abs_tolerance {
            return Ok((
                DVector::zeros(n),
                SolveInfo {
                    iterations: 0,
                    residual_norm: Some(b_norm),
                    solver_name,
                },
            ));
        }

        let inv_diag = self.inverse_diagonal(matrix)?;

        let mut x = DVector::zeros(n);
        let mut r = rhs.clone();
        let mut z = r.component_mul(&inv_diag);
        let mut p = z.clone();
        let mut rz = r.dot(&z);

        for iteration in 1..=self.max_iterations {
            let ap = csr_mul(matrix, &p);
            let p_ap = p.dot(&ap);
            if p_ap <= 0.0 {
                return Err(BackendError(format!(
                    "CG breakdown at iteration {} (pᵀKp = {:.3e}, matrix not SPD?)",
                    iteration, p_ap
                )));
            }
            let alpha = rz / p_ap;

            x.axpy(alpha, &p, 1.0);
            r.axpy(-alpha, &ap, 1.0);

            let r_norm = r.norm();
            if r_norm < self.tolerance * b_norm || r_norm < self.abs_tolerance {
                return Ok((
                    x,
                    SolveInfo {
                        iterations: iteration,
                        residual_norm: Some(r_norm),
                        solver_name,
                    },
                ));
            }

            z = r.component_mul(&inv_diag);
            let rz_new = r.dot(&z);
            let beta = rz_new / rz;
            rz = rz_new;
            p = &z + beta * &p;
        }

        Err(BackendError(format!(
            "CG did not converge in {} iterations (residual = {:.3e})",
            self.max_iterations,
            r.norm()
        )))
    }
}
