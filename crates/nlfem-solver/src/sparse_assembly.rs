//! Global sparse assembly.
//!
//! Local element blocks are scattered to global (row, col) pairs taken from
//! the [`DofMap`], collected as COO triplets and converted to CSR, which
//! sums duplicate entries. Constrained DOFs are eliminated by dropping
//! every triplet in their row or column and inserting a unit diagonal, so
//! the solved increment at a constrained DOF equals its right-hand side.

use crate::dof_map::DofMap;
use crate::error::{FemError, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Assemble local stiffness blocks into a global CSR matrix
///
/// `stiffness[e]` is the local block of element `e`; entry (i, j) lands at
/// global (idx[e][i], idx[e][j]). `constrained` flags each global DOF.
pub fn assemble_stiffness(
    dof_map: &DofMap,
    stiffness: &[DMatrix<f64>],
    constrained: &[bool],
) -> Result<CsrMatrix<f64>> {
    let n_dofs = dof_map.n_dofs();
    let n_local = dof_map.local_size();

    if stiffness.len() != dof_map.n_elements() {
        return Err(FemError::Assembly(format!(
            "received {} stiffness blocks for {} elements",
            stiffness.len(),
            dof_map.n_elements()
        )));
    }
    if constrained.len() != n_dofs {
        return Err(FemError::Assembly(format!(
            "constraint mask has {} entries, expected {}",
            constrained.len(),
            n_dofs
        )));
    }
    if let Some(e) = stiffness.iter().position(|k| k.shape() != (n_local, n_local)) {
        return Err(FemError::Assembly(format!(
            "stiffness block of element {} has shape {:?}, expected {}x{}",
            e,
            stiffness[e].shape(),
            n_local,
            n_local
        )));
    }

    let capacity = dof_map.rows().len() + n_dofs;
    let mut rows = Vec::with_capacity(capacity);
    let mut cols = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);

    // Pairs run over (element, i, j) with j fastest
    let local_values = stiffness
        .iter()
        .flat_map(|k| (0..n_local).flat_map(move |i| (0..n_local).map(move |j| k[(i, j)])));

    for ((row, col), value) in dof_map.stiffness_pairs().zip(local_values) {
        if constrained[row] || constrained[col] {
            continue;
        }
        rows.push(row);
        cols.push(col);
        values.push(value);
    }

    for dof in (0..n_dofs).filter(|&dof| constrained[dof]) {
        rows.push(dof);
        cols.push(dof);
        values.push(1.0);
    }

    let coo = CooMatrix::try_from_triplets(n_dofs, n_dofs, rows, cols, values)
        .map_err(|e| FemError::Assembly(format!("Failed to create COO matrix: {:?}", e)))?;

    Ok(CsrMatrix::from(&coo))
}

/// Sum local internal force vectors into a global DOF vector
pub fn assemble_force(dof_map: &DofMap, force: &[DVector<f64>]) -> Result<DVector<f64>> {
    if force.len() != dof_map.n_elements() {
        return Err(FemError::Assembly(format!(
            "received {} force vectors for {} elements",
            force.len(),
            dof_map.n_elements()
        )));
    }

    let mut global = DVector::zeros(dof_map.n_dofs());
    for (e, f) in force.iter().enumerate() {
        let dofs = dof_map.element_dofs(e);
        if f.len() != dofs.len() {
            return Err(FemError::Assembly(format!(
                "force vector of element {} has {} entries, expected {}",
                e,
                f.len(),
                dofs.len()
            )));
        }
        for (&dof, &value) in dofs.iter().zip(f.iter()) {
            global[dof] += value;
        }
    }
    Ok(global)
}

/// Dense copy of a CSR matrix
pub fn to_dense(matrix: &CsrMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(matrix.nrows(), matrix.ncols());
    for (row, col, &value) in matrix.triplet_iter() {
        dense[(row, col)] += value;
    }
    dense
}
