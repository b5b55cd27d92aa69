//! Line elements.
//!
//! Reference coordinate ξ ∈ [-1, 1]. Nodes 0 and 1 are the end points;
//! `Bar2` adds a mid node at index 2.

use super::quadrature::gauss_1d;
use super::Element;
use nalgebra::{DMatrix, DVector};

/// Bar1: 2-node linear line element, 1-point rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Bar1;

impl Element for Bar1 {
    fn nodes(&self) -> usize {
        2
    }

    fn iweights(&self) -> Vec<f64> {
        vec![2.0]
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        vec![DVector::from_element(1, 0.0)]
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(vec![0.5 * (1.0 - xi[0]), 0.5 * (1.0 + xi[0])])
    }

    fn b(&self, _xi: &DVector<f64>) -> DMatrix<f64> {
        DMatrix::from_row_slice(1, 2, &[-0.5, 0.5])
    }
}

/// Bar2: 3-node quadratic line element, 2-point rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Bar2;

impl Element for Bar2 {
    fn nodes(&self) -> usize {
        3
    }

    fn iweights(&self) -> Vec<f64> {
        gauss_1d(2).into_iter().map(|(_, w)| w).collect()
    }

    fn ipoints(&self) -> Vec<DVector<f64>> {
        gauss_1d(2)
            .into_iter()
            .map(|(x, _)| DVector::from_element(1, x))
            .collect()
    }

    fn n(&self, xi: &DVector<f64>) -> DVector<f64> {
        let x = xi[0];
        DVector::from_vec(vec![
            0.5 * x * (x - 1.0),
            0.5 * x * (x + 1.0),
            1.0 - x * x,
        ])
    }

    fn b(&self, xi: &DVector<f64>) -> DMatrix<f64> {
        let x = xi[0];
        DMatrix::from_row_slice(1, 3, &[x - 0.5, x + 0.5, -2.0 * x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar1_shape_functions_interpolate_end_nodes() {
        let n = Bar1.n(&DVector::from_element(1, -1.0));
        assert_eq!(n.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn bar2_mid_node_peaks_at_center() {
        let n = Bar2.n(&DVector::from_element(1, 0.0));
        assert_eq!(n.as_slice(), &[0.0, 0.0, 1.0]);
    }
}
