//! Incremental nonlinear static analysis with Newton-Raphson iteration.
//!
//! Solves the equilibrium equation
//! R(Δu) = F_int(u_{n-1} + Δu) − λ_n F_ext = 0
//! for each load factor λ_n of an increasing sequence.
//!
//! # Newton-Raphson Method
//!
//! Within increment n:
//! 1. Set constrained entries of the trial increment Δu to (λ_n − λ_{n-1}) ū
//! 2. Integrate all elements: internal forces, tangent, updated fields
//! 3. Residual: R = F_int − λ_n F_ext, zero at constrained DOFs
//! 4. Check convergence: max|R| / max|F_int| < tol
//! 5. Solve K_T δ = R and update Δu ← Δu − δ
//!
//! The tangent of a material without internal state is constant, so it is
//! assembled on the first iteration and reused for the rest of the solve.
//!
//! # Example
//!
//! ```no_run
//! use nlfem_solver::{DenseLu, Model, NonlinearConfig, NonlinearSolver, Result};
//! use nlfem_solver::elements::Element;
//! use nlfem_solver::kinematics::Kinematics;
//! use nlfem_solver::materials::Material;
//!
//! fn run<E: Element, K: Kinematics, M: Material>(model: &Model<E, K, M>) -> Result<()> {
//!     let config = NonlinearConfig::default();
//!     let results = NonlinearSolver::new(model, &DenseLu, config).solve()?;
//!
//!     if let Some(last) = results.last() {
//!         println!("Converged in {} iterations", last.iterations);
//!         println!("Final displacement norm: {:.6}", last.displacement.norm());
//!     }
//!     Ok(())
//! }
//! ```

use crate::backend::LinearSolver;
use crate::boundary_conditions::{dofs_to_nodal, nodal_to_dofs};
use crate::elements::Element;
use crate::error::{FemError, Result};
use crate::integration::{mean_over_points, PointFields};
use crate::kinematics::Kinematics;
use crate::materials::Material;
use crate::model::Model;
use crate::sparse_assembly::{assemble_force, assemble_stiffness};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

/// Nonlinear solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonlinearConfig {
    /// Increasing load factors; the first entry is the unloaded reference
    pub increments: Vec<f64>,
    /// Maximum Newton iterations per increment
    pub max_iterations: usize,
    /// Relative residual tolerance
    pub tolerance: f64,
    /// Print the residual of every iteration
    pub verbose: bool,
    /// Return every increment instead of only the last one
    pub return_intermediate: bool,
    /// Average strain, stress and state over integration points
    pub aggregate_integration_points: bool,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        Self {
            increments: vec![0.0, 1.0],
            max_iterations: 10,
            tolerance: 1e-4,
            verbose: false,
            return_intermediate: false,
            aggregate_integration_points: true,
        }
    }
}

impl NonlinearConfig {
    pub fn validate(&self) -> Result<()> {
        if self.increments.is_empty() {
            return Err(FemError::InvalidInput("increments must not be empty".into()));
        }
        if self.increments.iter().any(|x| !x.is_finite()) {
            return Err(FemError::InvalidInput("increments must be finite".into()));
        }
        if let Some(pair) = self.increments.windows(2).find(|w| w[1] <= w[0]) {
            return Err(FemError::InvalidInput(format!(
                "increments must be strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }
        if self.max_iterations == 0 {
            return Err(FemError::InvalidInput("max_iterations must be at least 1".into()));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(FemError::InvalidInput(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Assembled tangent carried between Newton iterations
#[derive(Debug, Clone, Default)]
pub struct StiffnessCache {
    matrix: Option<CsrMatrix<f64>>,
}

impl StiffnessCache {
    /// Whether the tangent has to be rebuilt for a material with
    /// `n_state` internal variables
    pub fn needs_update(&self, n_state: usize) -> bool {
        self.matrix.is_none() || n_state > 0
    }

    pub fn store(self, matrix: CsrMatrix<f64>) -> Self {
        Self {
            matrix: Some(matrix),
        }
    }

    pub fn matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.matrix.as_ref()
    }
}

/// Residual F_int − F_ext with constrained entries set to zero
pub fn constrained_residual(
    f_int: &DVector<f64>,
    f_ext: &DVector<f64>,
    constraints: &[bool],
) -> DVector<f64> {
    let mut residual = f_int - f_ext;
    for (r, _) in residual
        .iter_mut()
        .zip(constraints.iter())
        .filter(|(_, fixed)| **fixed)
    {
        *r = 0.0;
    }
    residual
}

/// max|R| / max|F_int|, or max|R| when the internal force vanishes
pub fn relative_residual(residual: &DVector<f64>, f_int: &DVector<f64>) -> f64 {
    let r_max = residual.amax();
    let f_max = f_int.amax();
    if f_max > 0.0 { r_max / f_max } else { r_max }
}

/// Integration point field in the requested layout
#[derive(Debug, Clone, PartialEq)]
pub enum PointField {
    /// One n_elem × n matrix per integration point
    PerPoint(Vec<DMatrix<f64>>),
    /// Mean over integration points, n_elem × n
    Averaged(DMatrix<f64>),
}

impl PointField {
    fn from_points(points: Vec<DMatrix<f64>>, aggregate: bool) -> Self {
        if aggregate {
            PointField::Averaged(mean_over_points(&points))
        } else {
            PointField::PerPoint(points)
        }
    }

    /// Element values, averaging per-point data if necessary
    pub fn averaged(&self) -> DMatrix<f64> {
        match self {
            PointField::Averaged(m) => m.clone(),
            PointField::PerPoint(points) => mean_over_points(points),
        }
    }

    pub fn per_point(&self) -> Option<&[DMatrix<f64>]> {
        match self {
            PointField::PerPoint(points) => Some(points),
            PointField::Averaged(_) => None,
        }
    }
}

/// Converged state at the end of one increment
#[derive(Debug, Clone)]
pub struct IncrementResult {
    pub load_factor: f64,
    /// Total nodal displacement (n_nodes × n_dim)
    pub displacement: DMatrix<f64>,
    /// Internal nodal force, including reactions (n_nodes × n_dim)
    pub force: DMatrix<f64>,
    pub strain: PointField,
    pub stress: PointField,
    pub state: PointField,
    /// Newton iterations used (0 for the reference state)
    pub iterations: usize,
    /// Relative residual of every iteration
    pub residual_history: Vec<f64>,
}

/// Nonlinear analysis results
#[derive(Debug, Clone)]
pub struct NonlinearResults {
    /// Every increment, or only the last one
    pub increments: Vec<IncrementResult>,
}

impl NonlinearResults {
    pub fn last(&self) -> Option<&IncrementResult> {
        self.increments.last()
    }

    pub fn total_iterations(&self) -> usize {
        self.increments.iter().map(|inc| inc.iterations).sum()
    }
}

/// Incremental Newton-Raphson solver over a [`Model`]
pub struct NonlinearSolver<'a, E, K, M> {
    model: &'a Model<E, K, M>,
    backend: &'a dyn LinearSolver,
    config: NonlinearConfig,
}

impl<'a, E: Element, K: Kinematics, M: Material> NonlinearSolver<'a, E, K, M> {
    /// Create a new nonlinear solver
    ///
    /// # Arguments
    /// * `model` - Mesh, collaborators and loading
    /// * `backend` - Linear solver for the Newton corrections
    /// * `config` - Increments, tolerances and output options
    pub fn new(
        model: &'a Model<E, K, M>,
        backend: &'a dyn LinearSolver,
        config: NonlinearConfig,
    ) -> Self {
        Self {
            model,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &NonlinearConfig {
        &self.config
    }

    /// Run the incremental solve
    ///
    /// # Errors
    /// Returns error if:
    /// - Configuration or loading arrays are invalid
    /// - Any element has a non-positive Jacobian determinant
    /// - The material or linear solver fails
    /// - An increment does not converge within `max_iterations`
    pub fn solve(&self) -> Result<NonlinearResults> {
        self.config.validate()?;
        self.model.validate()?;

        let mesh = self.model.mesh();
        let dof_map = self.model.dof_map();
        let integrator = self.model.integrator();
        let n_dim = mesh.n_dim();
        let n_dofs = dof_map.n_dofs();
        let n_state = self.model.material().n_state();
        let aggregate = self.config.aggregate_integration_points;

        let bcs = &self.model.bcs;
        let forces = nodal_to_dofs(&bcs.forces);
        let displacements = nodal_to_dofs(&bcs.displacements);
        let constraints = &bcs.constraints;
        let constrained = bcs.constrained_dofs();

        let mut fields = self.model.initial_fields();
        let mut u = DVector::zeros(n_dofs);
        let mut du = DVector::zeros(n_dofs);
        let mut cache = StiffnessCache::default();

        let record = |load_factor: f64,
                      u: &DVector<f64>,
                      f: &DVector<f64>,
                      fields: &PointFields,
                      iterations: usize,
                      residual_history: Vec<f64>| IncrementResult {
            load_factor,
            displacement: dofs_to_nodal(u, n_dim),
            force: dofs_to_nodal(f, n_dim),
            strain: PointField::from_points(fields.strain.clone(), aggregate),
            stress: PointField::from_points(fields.stress.clone(), aggregate),
            state: PointField::from_points(fields.state.clone(), aggregate),
            iterations,
            residual_history,
        };

        let increments = &self.config.increments;
        let mut results = Vec::new();
        let mut last = record(increments[0], &u, &DVector::zeros(n_dofs), &fields, 0, Vec::new());

        for n in 1..increments.len() {
            let step = increments[n] - increments[n - 1];
            let f_ext = &forces * increments[n];
            let du_target = &displacements * step;
            let de0 = &self.model.ext_strain * step;

            let mut residual_history = Vec::with_capacity(self.config.max_iterations);
            let mut converged = None;

            for i in 0..self.config.max_iterations {
                for &dof in &constrained {
                    du[dof] = du_target[dof];
                }

                let response =
                    integrator.integrate(&fields, &du, &de0, cache.needs_update(n_state))?;
                let f_int = assemble_force(dof_map, &response.force)?;
                if let Some(blocks) = &response.stiffness {
                    cache = cache.store(assemble_stiffness(dof_map, blocks, constraints)?);
                }

                let residual = constrained_residual(&f_int, &f_ext, constraints);
                let res_norm = relative_residual(&residual, &f_int);
                residual_history.push(res_norm);

                if self.config.verbose {
                    println!(
                        "Increment {} | Iteration {} | Residual: {:.5}",
                        n,
                        i + 1,
                        res_norm
                    );
                }

                if res_norm < self.config.tolerance {
                    converged = Some((response.fields, f_int));
                    break;
                }

                let k = cache
                    .matrix()
                    .ok_or_else(|| FemError::Assembly("tangent stiffness not assembled".into()))?;
                let (correction, _info) = self.backend.solve_linear(k, &residual)?;
                du -= correction;
            }

            let Some((new_fields, f_int)) = converged else {
                return Err(FemError::NotConverged {
                    increment: n,
                    iterations: self.config.max_iterations,
                    residual: residual_history.last().copied().unwrap_or(f64::NAN),
                });
            };

            u += &du;
            fields = new_fields;
            let iterations = residual_history.len();
            let current = record(increments[n], &u, &f_int, &fields, iterations, residual_history);
            if self.config.return_intermediate {
                results.push(std::mem::replace(&mut last, current));
            } else {
                last = current;
            }
        }

        results.push(last);
        Ok(NonlinearResults {
            increments: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DenseLu;
    use crate::elements::Bar1;
    use crate::kinematics::Truss;
    use crate::materials::{IsotropicElasticity1D, IsotropicPlasticity1D};
    use crate::mesh::Mesh;
    use approx::assert_relative_eq;

    fn bar_model<M: Material>(material: M) -> Model<Bar1, Truss, M> {
        let nodes = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let mesh = Mesh::new(nodes, vec![vec![0, 1]]).unwrap();
        let mut model = Model::new(mesh, Bar1, Truss::new(1.0), material).unwrap();
        model.bcs.fix(0, 0).unwrap();
        model
    }

    #[test]
    fn test_nonlinear_config_default() {
        let config = NonlinearConfig::default();
        assert_eq!(config.increments, vec![0.0, 1.0]);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.tolerance, 1e-4);
        assert!(!config.verbose);
        assert!(!config.return_intermediate);
        assert!(config.aggregate_integration_points);
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: NonlinearConfig =
            serde_json::from_str(r#"{"increments": [0.0, 0.5, 1.0], "verbose": true}"#).unwrap();
        assert_eq!(config.increments.len(), 3);
        assert!(config.verbose);
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = NonlinearConfig::default();
        config.increments = vec![0.0, 1.0, 1.0];
        assert!(config.validate().is_err());

        let mut config = NonlinearConfig::default();
        config.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = NonlinearConfig::default();
        config.tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_residual_is_zero_at_constraints() {
        let f_int = DVector::from_vec(vec![5.0, 1.0, -2.0]);
        let f_ext = DVector::from_vec(vec![0.0, 1.5, 0.0]);
        let r = constrained_residual(&f_int, &f_ext, &[true, false, false]);
        assert_eq!(r.as_slice(), &[0.0, -0.5, -2.0]);
        assert_relative_eq!(relative_residual(&r, &f_int), 2.0 / 5.0);
    }

    #[test]
    fn test_relative_residual_without_internal_force() {
        let zero = DVector::zeros(2);
        assert_eq!(relative_residual(&zero, &zero), 0.0);
        let r = DVector::from_vec(vec![0.0, -3.0]);
        assert_eq!(relative_residual(&r, &zero), 3.0);
    }

    #[test]
    fn test_stiffness_cache_update_rule() {
        let cache = StiffnessCache::default();
        assert!(cache.needs_update(0));
        let cache = cache.store(CsrMatrix::identity(2));
        assert!(!cache.needs_update(0));
        assert!(cache.needs_update(1));
    }

    #[test]
    fn test_solves_linear_bar() {
        let mut model = bar_model(IsotropicElasticity1D::new(100.0));
        model.bcs.add_force(1, 0, 2.0).unwrap();

        let results = NonlinearSolver::new(&model, &DenseLu, NonlinearConfig::default())
            .solve()
            .unwrap();
        let last = results.last().unwrap();

        assert_eq!(results.increments.len(), 1);
        assert_eq!(last.iterations, 2);
        assert_relative_eq!(last.displacement[(1, 0)], 0.02, epsilon = 1e-12);
        assert_relative_eq!(last.stress.averaged()[(0, 0)], 2.0, epsilon = 1e-10);
        // reaction at the support balances the load
        assert_relative_eq!(last.force[(0, 0)], -2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_history_is_returned_per_increment() {
        let mut model = bar_model(IsotropicElasticity1D::new(100.0));
        model.bcs.add_force(1, 0, 1.0).unwrap();

        let config = NonlinearConfig {
            increments: vec![0.0, 0.25, 1.0],
            return_intermediate: true,
            aggregate_integration_points: false,
            ..Default::default()
        };
        let results = NonlinearSolver::new(&model, &DenseLu, config).solve().unwrap();

        assert_eq!(results.increments.len(), 3);
        assert_eq!(results.increments[0].iterations, 0);
        assert_eq!(results.increments[0].displacement[(1, 0)], 0.0);
        assert_relative_eq!(results.increments[1].displacement[(1, 0)], 0.0025, epsilon = 1e-12);
        assert_relative_eq!(results.increments[2].displacement[(1, 0)], 0.01, epsilon = 1e-12);
        assert!(results.increments[2].stress.per_point().is_some());
    }

    #[test]
    fn test_not_converged_is_reported() {
        let mut model = bar_model(IsotropicPlasticity1D::new(1000.0, 1.0, 100.0));
        model.bcs.add_force(1, 0, 2.0).unwrap();

        let config = NonlinearConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let err = NonlinearSolver::new(&model, &DenseLu, config).solve().unwrap_err();
        assert!(matches!(err, FemError::NotConverged { increment: 1, iterations: 1, .. }));
        assert!(err.to_string().contains("Newton-Raphson iteration did not converge"));
    }
}
