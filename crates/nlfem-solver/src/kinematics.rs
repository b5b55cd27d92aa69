//! Problem formulations.
//!
//! A formulation turns physical shape function gradients into the strain
//! operator `D` (n_strains × local DOFs) and integrates stiffness and
//! internal force contributions at one quadrature point. The integrator
//! only talks to the [`Kinematics`] trait.

use nalgebra::{DMatrix, DVector};

/// Formulation-specific operations used by the element integrator
pub trait Kinematics: Send + Sync {
    /// Number of strain components produced by [`Kinematics::strain_operator`]
    fn n_strains(&self) -> usize;

    /// Whether this formulation works in `n_dim` spatial dimensions with
    /// elements of reference dimension `reference_dim`
    fn supports(&self, n_dim: usize, reference_dim: usize) -> bool;

    /// Strain operator for one element
    ///
    /// * `b` - physical gradients (reference_dim × nodes)
    /// * `nodes` - nodal coordinates (nodes × n_dim)
    fn strain_operator(&self, b: &DMatrix<f64>, nodes: &DMatrix<f64>) -> DMatrix<f64>;

    /// Stiffness contribution from `dcd = Dᵀ C D` at one point
    fn compute_k(&self, det_j: f64, dcd: &DMatrix<f64>) -> DMatrix<f64>;

    /// Internal force contribution `Dᵀ σ` at one point
    fn compute_f(&self, det_j: f64, d: &DMatrix<f64>, stress: &DVector<f64>) -> DVector<f64>;
}

/// Axial bars in any spatial dimension
///
/// Strain is the axial strain along the bar direction; the direction is
/// taken from the first two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Truss {
    /// Cross-sectional area
    pub area: f64,
}

impl Truss {
    pub fn new(area: f64) -> Self {
        Self { area }
    }
}

impl Kinematics for Truss {
    fn n_strains(&self) -> usize {
        1
    }

    fn supports(&self, _n_dim: usize, reference_dim: usize) -> bool {
        reference_dim == 1
    }

    fn strain_operator(&self, b: &DMatrix<f64>, nodes: &DMatrix<f64>) -> DMatrix<f64> {
        let n_dim = nodes.ncols();
        let axis = (nodes.row(1) - nodes.row(0)).transpose();
        let length = axis.norm();
        let direction = if length > 0.0 { axis / length } else { axis };

        let mut d = DMatrix::zeros(1, b.ncols() * n_dim);
        for a in 0..b.ncols() {
            for i in 0..n_dim {
                d[(0, a * n_dim + i)] = b[(0, a)] * direction[i];
            }
        }
        d
    }

    fn compute_k(&self, det_j: f64, dcd: &DMatrix<f64>) -> DMatrix<f64> {
        dcd * (self.area * det_j)
    }

    fn compute_f(&self, det_j: f64, d: &DMatrix<f64>, stress: &DVector<f64>) -> DVector<f64> {
        d.tr_mul(stress) * (self.area * det_j)
    }
}

/// Two-dimensional continuum with out-of-plane thickness
///
/// Strains: [εxx, εyy, γxy]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planar {
    pub thickness: f64,
}

impl Planar {
    pub fn new(thickness: f64) -> Self {
        Self { thickness }
    }
}

impl Default for Planar {
    fn default() -> Self {
        Self { thickness: 1.0 }
    }
}

impl Kinematics for Planar {
    fn n_strains(&self) -> usize {
        3
    }

    fn supports(&self, n_dim: usize, reference_dim: usize) -> bool {
        n_dim == 2 && reference_dim == 2
    }

    fn strain_operator(&self, b: &DMatrix<f64>, _nodes: &DMatrix<f64>) -> DMatrix<f64> {
        let mut d = DMatrix::zeros(3, 2 * b.ncols());
        for a in 0..b.ncols() {
            let (dx, dy) = (b[(0, a)], b[(1, a)]);
            d[(0, 2 * a)] = dx;
            d[(1, 2 * a + 1)] = dy;
            d[(2, 2 * a)] = dy;
            d[(2, 2 * a + 1)] = dx;
        }
        d
    }

    fn compute_k(&self, det_j: f64, dcd: &DMatrix<f64>) -> DMatrix<f64> {
        dcd * (self.thickness * det_j)
    }

    fn compute_f(&self, det_j: f64, d: &DMatrix<f64>, stress: &DVector<f64>) -> DVector<f64> {
        d.tr_mul(stress) * (self.thickness * det_j)
    }
}

/// Three-dimensional continuum
///
/// Strains (Voigt notation): [εxx, εyy, εzz, γxy, γyz, γzx]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Solid;

impl Kinematics for Solid {
    fn n_strains(&self) -> usize {
        6
    }

    fn supports(&self, n_dim: usize, reference_dim: usize) -> bool {
        n_dim == 3 && reference_dim == 3
    }

    /// For each node a:
    /// ```text
    /// [∂N/∂x    0        0    ]
    /// [0        ∂N/∂y    0    ]
    /// [0        0        ∂N/∂z]
    /// [∂N/∂y    ∂N/∂x    0    ]
    /// [0        ∂N/∂z    ∂N/∂y]
    /// [∂N/∂z    0        ∂N/∂x]
    /// ```
    fn strain_operator(&self, b: &DMatrix<f64>, _nodes: &DMatrix<f64>) -> DMatrix<f64> {
        let mut d = DMatrix::zeros(6, 3 * b.ncols());
        for a in 0..b.ncols() {
            let (dx, dy, dz) = (b[(0, a)], b[(1, a)], b[(2, a)]);
            let col = 3 * a;

            d[(0, col)] = dx;
            d[(1, col + 1)] = dy;
            d[(2, col + 2)] = dz;

            d[(3, col)] = dy;
            d[(3, col + 1)] = dx;

            d[(4, col + 1)] = dz;
            d[(4, col + 2)] = dy;

            d[(5, col + 2)] = dx;
            d[(5, col)] = dz;
        }
        d
    }

    fn compute_k(&self, det_j: f64, dcd: &DMatrix<f64>) -> DMatrix<f64> {
        dcd * det_j
    }

    fn compute_f(&self, det_j: f64, d: &DMatrix<f64>, stress: &DVector<f64>) -> DVector<f64> {
        d.tr_mul(stress) * det_j
    }
}
