//! Mesh data structures for finite element analysis.
//!
//! A mesh is an ordered set of nodal coordinates (one row per node, one
//! column per spatial dimension) and an ordered set of elements, each a
//! fixed-size tuple of 0-based node indices. The mesh is immutable once
//! constructed.

use crate::error::{FemError, Result};
use nalgebra::DMatrix;

/// Finite element mesh with uniform element connectivity
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Nodal coordinates (n_nodes × n_dim)
    nodes: DMatrix<f64>,
    /// Element connectivity (n_elements × nodes_per_element)
    elements: Vec<Vec<usize>>,
}

impl Mesh {
    /// Create a mesh from nodal coordinates and element connectivity
    ///
    /// # Errors
    /// Returns [`FemError::InvalidMesh`] if the mesh has no nodes or no
    /// elements, if elements have different node counts, or if an element
    /// references a node that does not exist.
    pub fn new(nodes: DMatrix<f64>, elements: Vec<Vec<usize>>) -> Result<Self> {
        if nodes.nrows() == 0 || nodes.ncols() == 0 {
            return Err(FemError::InvalidMesh("mesh has no nodes".into()));
        }
        let Some(first) = elements.first() else {
            return Err(FemError::InvalidMesh("mesh has no elements".into()));
        };
        let nodes_per_element = first.len();
        if nodes_per_element == 0 {
            return Err(FemError::InvalidMesh("elements have no nodes".into()));
        }

        for (elem_idx, connectivity) in elements.iter().enumerate() {
            if connectivity.len() != nodes_per_element {
                return Err(FemError::InvalidMesh(format!(
                    "element {} has {} nodes, expected {}",
                    elem_idx,
                    connectivity.len(),
                    nodes_per_element
                )));
            }
            if let Some(&node) = connectivity.iter().find(|&&n| n >= nodes.nrows()) {
                return Err(FemError::InvalidMesh(format!(
                    "element {} references node {} but mesh has {} nodes",
                    elem_idx,
                    node,
                    nodes.nrows()
                )));
            }
        }

        Ok(Self { nodes, elements })
    }

    /// Nodal coordinates (n_nodes × n_dim)
    pub fn nodes(&self) -> &DMatrix<f64> {
        &self.nodes
    }

    /// Element connectivity
    pub fn elements(&self) -> &[Vec<usize>] {
        &self.elements
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.nrows()
    }

    pub fn n_dim(&self) -> usize {
        self.nodes.ncols()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn nodes_per_element(&self) -> usize {
        self.elements[0].len()
    }

    /// Total number of degrees of freedom (n_nodes × n_dim)
    pub fn n_dofs(&self) -> usize {
        self.nodes.len()
    }

    /// Coordinates of the nodes of one element (nodes_per_element × n_dim)
    pub fn element_coords(&self, elem_idx: usize) -> DMatrix<f64> {
        let connectivity = &self.elements[elem_idx];
        DMatrix::from_fn(connectivity.len(), self.n_dim(), |i, j| {
            self.nodes[(connectivity[i], j)]
        })
    }
}
