//! Three-dimensional elements.
//!
//! - Tetra1: 4-node linear tetrahedron, 1-point rule
//! - Hexa1: 8-node trilinear hexahedron (brick), 2×2×2 Gauss rule

use super::quadrature::{gauss_tensor, simplex_centroid};
use super::Element;
use nalgebra::{DMatrix, DVector};

/// Tetra1: 4-node linear tetrahedron
///
/// Nodes at (0,0,0), (1,0,0), (0,1,0), (0,0,1) in reference coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tetra1;

impl Element for Tetra1 {
    fn nodes(&self) -> usize {
        4
    }

    fn iweights(&self) -> Vec<f64> {
        simplex_centroid(3).1
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        simplex_centroid(3).0
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(vec![1.0 - xi[0] - xi[1] - xi[2], xi[0], xi[1], xi[2]])
    }

    fn b(&self, _xi: &DVector<f64>) -> DMatrix<f64> {
        DMatrix::from_row_slice(
            3,
            4,
            &[
                -1.0, 1.0, 0.0, 0.0, //
                -1.0, 0.0, 1.0, 0.0, //
                -1.0, 0.0, 0.0, 1.0,
            ],
        )
    }
}

/// Hexa1: 8-node hexahedral (brick) element
///
/// Node ordering:
/// ```text
///        7----------6
///       /|         /|
///      / |        / |
///     4----------5  |
///     |  3-------|--2
///     | /        | /
///     |/         |/
///     0----------1
/// ```
///
/// - Bottom face: nodes 0,1,2,3 (ζ = -1)
/// - Top face: nodes 4,5,6,7 (ζ = +1)
/// - Local coordinates: ξ, η, ζ ∈ [-1, 1]³
#[derive(Debug, Clone, Copy, Default)]
pub struct Hexa1;

impl Hexa1 {
    /// Natural coordinates of the 8 nodes
    const XI_N: [f64; 8] = [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0];
    const ETA_N: [f64; 8] = [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
    const ZETA_N: [f64; 8] = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];
}

impl Element for Hexa1 {
    fn nodes(&self) -> usize {
        8
    }

    fn iweights(&self) -> Vec<f64> {
        gauss_tensor(2, 3).1
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        gauss_tensor(2, 3).0
    }

    /// N_i = (1 + ξξ_i)(1 + ηη_i)(1 + ζζ_i) / 8
    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        let (x, y, z) = (xi[0], xi[1], xi[2]);
        DVector::from_fn(8, |i, _| {
            (1.0 + x * Self::XI_N[i]) * (1.0 + y * Self::ETA_N[i]) * (1.0 + z * Self::ZETA_N[i])
                / 8.0
        })
    }

    /// Rows: dN/dξ, dN/dη, dN/dζ for all 8 nodes
    fn b(&self, xi: &DVector<f64>) -> DMatrix<f64> {
        let (x, y, z) = (xi[0], xi[1], xi[2]);
        let mut b = DMatrix::zeros(3, 8);

        for i in 0..8 {
            let (xi_i, eta_i, zeta_i) = (Self::XI_N[i], Self::ETA_N[i], Self::ZETA_N[i]);

            // dN_i/dξ = ξ_i(1 + ηη_i)(1 + ζζ_i) / 8
            b[(0, i)] = xi_i * (1.0 + y * eta_i) * (1.0 + z * zeta_i) / 8.0;

            // dN_i/dη = (1 + ξξ_i)η_i(1 + ζζ_i) / 8
            b[(1, i)] = (1.0 + x * xi_i) * eta_i * (1.0 + z * zeta_i) / 8.0;

            // dN_i/dζ = (1 + ξξ_i)(1 + ηη_i)ζ_i / 8
            b[(2, i)] = (1.0 + x * xi_i) * (1.0 + y * eta_i) * zeta_i / 8.0;
        }

        b
    }
}
