//! Local-to-global degree of freedom mapping.
//!
//! Built once per model from the mesh topology. Node `n` owns the global
//! DOFs `n * n_dim .. n * n_dim + n_dim`; an element's local DOFs are its
//! nodes' DOFs in connectivity order.

use crate::mesh::Mesh;

/// Precomputed DOF table and sparse coordinate pairs for assembly
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    n_dofs: usize,
    local_size: usize,
    /// Global DOF per (element, local DOF), flattened row-major
    table: Vec<usize>,
    /// Global row per stiffness entry (element, i, j)
    rows: Vec<usize>,
    /// Global column per stiffness entry (element, i, j)
    cols: Vec<usize>,
}

impl DofMap {
    pub fn new(mesh: &Mesh) -> Self {
        let n_dim = mesh.n_dim();
        let local_size = n_dim * mesh.nodes_per_element();
        let n_elem = mesh.n_elements();

        let table: Vec<usize> = mesh
            .elements()
            .iter()
            .flat_map(|connectivity| {
                connectivity
                    .iter()
                    .flat_map(move |&node| (0..n_dim).map(move |d| node * n_dim + d))
            })
            .collect();

        let n_pairs = n_elem * local_size * local_size;
        let mut rows = Vec::with_capacity(n_pairs);
        let mut cols = Vec::with_capacity(n_pairs);
        for dofs in table.chunks(local_size) {
            for &row in dofs {
                for &col in dofs {
                    rows.push(row);
                    cols.push(col);
                }
            }
        }

        Self {
            n_dofs: mesh.n_dofs(),
            local_size,
            table,
            rows,
            cols,
        }
    }

    /// Size of the global system
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Number of local DOFs per element (n_dim × nodes_per_element)
    pub fn local_size(&self) -> usize {
        self.local_size
    }

    pub fn n_elements(&self) -> usize {
        self.table.len() / self.local_size
    }

    /// Global DOF indices touched by one element
    pub fn element_dofs(&self, elem_idx: usize) -> &[usize] {
        &self.table[elem_idx * self.local_size..(elem_idx + 1) * self.local_size]
    }

    /// Global row index of every local stiffness entry
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Global column index of every local stiffness entry
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// (row, col) pairs in `(element, i, j)` order
    pub fn stiffness_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn two_bars_2d() -> Mesh {
        let nodes = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
        Mesh::new(nodes, vec![vec![0, 1], vec![1, 2]]).unwrap()
    }

    #[test]
    fn element_dofs_follow_connectivity() {
        let map = DofMap::new(&two_bars_2d());
        assert_eq!(map.n_dofs(), 6);
        assert_eq!(map.local_size(), 4);
        assert_eq!(map.element_dofs(0), &[0, 1, 2, 3]);
        assert_eq!(map.element_dofs(1), &[2, 3, 4, 5]);
    }

    #[test]
    fn element_dofs_with_offset_nodes() {
        let nodes = DMatrix::zeros(10, 3);
        let mesh = Mesh::new(nodes, vec![vec![4, 9]]).unwrap();
        let map = DofMap::new(&mesh);
        assert_eq!(map.element_dofs(0), &[12, 13, 14, 27, 28, 29]);
    }

    #[test]
    fn pairs_cover_every_block_entry_in_row_major_order() {
        let map = DofMap::new(&two_bars_2d());
        let pairs: Vec<_> = map.stiffness_pairs().collect();
        assert_eq!(pairs.len(), 2 * 4 * 4);

        // element 0, i = 0
        assert_eq!(&pairs[0..4], &[(0, 0), (0, 1), (0, 2), (0, 3)]);
        // element 0, i = 1, j = 2
        assert_eq!(pairs[6], (1, 2));
        // element 1 starts at (2, 2)
        assert_eq!(pairs[16], (2, 2));
        assert_eq!(*pairs.last().unwrap(), (5, 5));
    }

    #[test]
    fn shared_node_pairs_repeat_across_elements() {
        let map = DofMap::new(&two_bars_2d());
        let count = map.stiffness_pairs().filter(|&p| p == (2, 2)).count();
        assert_eq!(count, 2);
    }
}
