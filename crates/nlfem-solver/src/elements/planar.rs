//! Two-dimensional elements.
//!
//! Quadrilateral node ordering (counter-clockwise):
//! ```text
//!     3-----6-----2
//!     |           |
//!     7           5
//!     |           |
//!     0-----4-----1
//! ```
//! `Quad1` uses the corner nodes 0..4 only. Reference coordinates are
//! (ξ, η) ∈ [-1, 1]². Triangles use the unit simplex with nodes at
//! (0,0), (1,0), (0,1).

use super::quadrature::{gauss_tensor, simplex_centroid};
use super::Element;
use nalgebra::{DMatrix, DVector};

const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
const MIDSIDES: [(f64, f64); 4] = [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];

/// Tria1: 3-node linear triangle, 1-point rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Tria1;

impl Element for Tria1 {
    fn nodes(&self) -> usize {
        3
    }

    fn iweights(&self) -> Vec<f64> {
        simplex_centroid(2).1
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        simplex_centroid(2).0
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(vec![1.0 - xi[0] - xi[1], xi[0], xi[1]])
    }

    fn b(&self, _xi: &DVector<f64>) -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 3, &[-1.0, 1.0, 0.0, -1.0, 0.0, 1.0])
    }
}

/// Quad1: 4-node bilinear quadrilateral, 2×2 Gauss rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Quad1;

impl Element for Quad1 {
    fn nodes(&self) -> usize {
        4
    }

    fn iweights(&self) -> Vec<f64> {
        gauss_tensor(2, 2).1
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        gauss_tensor(2, 2).0
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        let (x, y) = (xi[0], xi[1]);
        DVector::from_iterator(
            4,
            CORNERS
                .iter()
                .map(|&(xa, ya)| 0.25 * (1.0 + x * xa) * (1.0 + y * ya)),
        )
    }

    fn b(&self, xi: &DVector<f64>) -> DMatrix<f64> {
        let (x, y) = (xi[0], xi[1]);
        let mut b = DMatrix::zeros(2, 4);
        for (a, &(xa, ya)) in CORNERS.iter().enumerate() {
            b[(0, a)] = 0.25 * xa * (1.0 + y * ya);
            b[(1, a)] = 0.25 * ya * (1.0 + x * xa);
        }
        b
    }
}

/// Quad2: 8-node serendipity quadrilateral, 3×3 Gauss rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Quad2;

impl Element for Quad2 {
    fn nodes(&self) -> usize {
        8
    }

    fn iweights(&self) -> Vec<f64> {
        gauss_tensor(3, 2).1
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        gauss_tensor(3, 2).0
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        let (x, y) = (xi[0], xi[1]);
        let mut n = DVector::zeros(8);
        for (a, &(xa, ya)) in CORNERS.iter().enumerate() {
            n[a] = 0.25 * (1.0 + x * xa) * (1.0 + y * ya) * (x * xa + y * ya - 1.0);
        }
        for (m, &(xa, ya)) in MIDSIDES.iter().enumerate() {
            n[4 + m] = if xa == 0.0 {
                0.5 * (1.0 - x * x) * (1.0 + y * ya)
            } else {
                0.5 * (1.0 + x * xa) * (1.0 - y * y)
            };
        }
        n
    }

    fn b(&self, xi: &DVector<f64>) -> DMatrix<f64> {
        let (x, y) = (xi[0], xi[1]);
        let mut b = DMatrix::zeros(2, 8);
        for (a, &(xa, ya)) in CORNERS.iter().enumerate() {
            b[(0, a)] = 0.25 * xa * (1.0 + y * ya) * (2.0 * x * xa + y * ya);
            b[(1, a)] = 0.25 * ya * (1.0 + x * xa) * (x * xa + 2.0 * y * ya);
        }
        for (m, &(xa, ya)) in MIDSIDES.iter().enumerate() {
            let a = 4 + m;
            if xa == 0.0 {
                b[(0, a)] = -x * (1.0 + y * ya);
                b[(1, a)] = 0.5 * (1.0 - x * x) * ya;
            } else {
                b[(0, a)] = 0.5 * xa * (1.0 - y * y);
                b[(1, a)] = -y * (1.0 + x * xa);
            }
        }
        b
    }
}
