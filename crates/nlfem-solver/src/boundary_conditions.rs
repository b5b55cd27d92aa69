//! Boundary conditions and loading for finite element analysis.
//!
//! Nodal quantities are stored as `n_nodes × n_dim` matrices. The global
//! DOF index of component `d` at node `n` is `n * n_dim + d`, which is the
//! numbering used by the DOF map and the assembled system.

use crate::error::{FemError, Result};
use nalgebra::{DMatrix, DVector};

/// Prescribed forces, prescribed displacements and Dirichlet constraints
///
/// `forces` and `displacements` are totals at load factor 1. During an
/// incremental solve the forces are scaled by the current load factor and
/// the displacements by the increment size.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConditions {
    /// Nodal forces (n_nodes × n_dim)
    pub forces: DMatrix<f64>,
    /// Prescribed nodal displacements (n_nodes × n_dim)
    pub displacements: DMatrix<f64>,
    /// Constraint flag per DOF (true = Dirichlet-constrained)
    pub constraints: Vec<bool>,
}

impl BoundaryConditions {
    /// Create unloaded, unconstrained boundary conditions
    pub fn new(n_nodes: usize, n_dim: usize) -> Self {
        Self {
            forces: DMatrix::zeros(n_nodes, n_dim),
            displacements: DMatrix::zeros(n_nodes, n_dim),
            constraints: vec![false; n_nodes * n_dim],
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.forces.nrows()
    }

    pub fn n_dim(&self) -> usize {
        self.forces.ncols()
    }

    fn dof_index(&self, node: usize, dof: usize) -> Result<usize> {
        if node >= self.n_nodes() || dof >= self.n_dim() {
            return Err(FemError::InvalidInput(format!(
                "DOF ({}, {}) out of range for {} nodes with {} DOFs each",
                node,
                dof,
                self.n_nodes(),
                self.n_dim()
            )));
        }
        Ok(node * self.n_dim() + dof)
    }

    /// Add a concentrated force to one nodal component
    pub fn add_force(&mut self, node: usize, dof: usize, value: f64) -> Result<()> {
        self.dof_index(node, dof)?;
        self.forces[(node, dof)] += value;
        Ok(())
    }

    /// Constrain one nodal component to a prescribed displacement
    pub fn prescribe(&mut self, node: usize, dof: usize, value: f64) -> Result<()> {
        let index = self.dof_index(node, dof)?;
        self.constraints[index] = true;
        self.displacements[(node, dof)] = value;
        Ok(())
    }

    /// Fix one nodal component (zero prescribed displacement)
    pub fn fix(&mut self, node: usize, dof: usize) -> Result<()> {
        self.prescribe(node, dof, 0.0)
    }

    /// Fix every component of a node
    pub fn fix_node(&mut self, node: usize) -> Result<()> {
        for dof in 0..self.n_dim() {
            self.fix(node, dof)?;
        }
        Ok(())
    }

    /// Indices of all constrained DOFs, ascending
    pub fn constrained_dofs(&self) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter_map(|(dof, &c)| c.then_some(dof))
            .collect()
    }

    /// Check that all arrays match a mesh with `n_nodes` nodes in `n_dim` dimensions
    pub fn validate(&self, n_nodes: usize, n_dim: usize) -> Result<()> {
        let shape_ok = |m: &DMatrix<f64>| m.nrows() == n_nodes && m.ncols() == n_dim;
        if !shape_ok(&self.forces) || !shape_ok(&self.displacements) {
            return Err(FemError::InvalidInput(format!(
                "forces {}x{} and displacements {}x{} must both be {}x{}",
                self.forces.nrows(),
                self.forces.ncols(),
                self.displacements.nrows(),
                self.displacements.ncols(),
                n_nodes,
                n_dim
            )));
        }
        if self.constraints.len() != n_nodes * n_dim {
            return Err(FemError::InvalidInput(format!(
                "constraints has {} entries, expected {}",
                self.constraints.len(),
                n_nodes * n_dim
            )));
        }
        Ok(())
    }
}

/// Flatten a nodal matrix (n_nodes × n_dim) into a DOF vector
pub fn nodal_to_dofs(values: &DMatrix<f64>) -> DVector<f64> {
    let n_dim = values.ncols();
    DVector::from_fn(values.len(), |i, _| values[(i / n_dim, i % n_dim)])
}

/// Reshape a DOF vector into a nodal matrix (n_nodes × n_dim)
pub fn dofs_to_nodal(values: &DVector<f64>, n_dim: usize) -> DMatrix<f64> {
    DMatrix::from_fn(values.len() / n_dim, n_dim, |n, d| values[n * n_dim + d])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescribe_sets_flag_and_value() {
        let mut bcs = BoundaryConditions::new(3, 2);
        bcs.prescribe(1, 1, 0.25).unwrap();
        bcs.fix(0, 0).unwrap();

        assert_eq!(bcs.constrained_dofs(), vec![0, 3]);
        assert_eq!(bcs.displacements[(1, 1)], 0.25);
        assert_eq!(bcs.displacements[(0, 0)], 0.0);
    }

    #[test]
    fn forces_accumulate() {
        let mut bcs = BoundaryConditions::new(2, 3);
        bcs.add_force(1, 2, 10.0).unwrap();
        bcs.add_force(1, 2, 5.0).unwrap();
        assert_eq!(bcs.forces[(1, 2)], 15.0);
    }

    #[test]
    fn out_of_range_dof_is_rejected() {
        let mut bcs = BoundaryConditions::new(2, 2);
        assert!(bcs.fix(2, 0).is_err());
        assert!(bcs.add_force(0, 2, 1.0).is_err());
    }

    #[test]
    fn fix_node_constrains_all_components() {
        let mut bcs = BoundaryConditions::new(2, 3);
        bcs.fix_node(1).unwrap();
        assert_eq!(bcs.constrained_dofs(), vec![3, 4, 5]);
    }

    #[test]
    fn nodal_flattening_is_node_major() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let v = nodal_to_dofs(&m);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(dofs_to_nodal(&v, 2), m);
    }

    #[test]
    fn validate_detects_shape_mismatch() {
        let bcs = BoundaryConditions::new(2, 2);
        assert!(bcs.validate(2, 2).is_ok());
        assert!(bcs.validate(3, 2).is_err());
    }
}
