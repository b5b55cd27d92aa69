//! Isoparametric element library.
//!
//! An element type provides its node count, a quadrature rule in reference
//! coordinates and the reference gradient operator `B(ξ) = ∂N/∂ξ`
//! (reference_dim × nodes). The integrator turns `B(ξ)` into physical
//! gradients through the geometric Jacobian, so any element family works
//! as long as it supplies these pieces.

use nalgebra::{DMatrix, DVector};

pub mod bar;
pub mod planar;
pub mod quadrature;
pub mod solid;

pub use bar::{Bar1, Bar2};
pub use planar::{Quad1, Quad2, Tria1};
pub use solid::{Hexa1, Tetra1};

/// Element interface for isoparametric integration
pub trait Element: Send + Sync {
    /// Number of nodes per element
    fn nodes(&self) -> usize;

    /// Quadrature weights, paired with [`Element::ipoints`]
    fn iweights(&self) -> Vec<f64>;

    /// Quadrature locations in reference coordinates
    fn ipoints(&self) -> Vec<DVector<f64>>;

    /// Shape function values at a reference location
    fn n(&self, xi: &DVector<f64>) -> DVector<f64>;

    /// Reference gradient operator at a reference location
    ///
    /// Row `k` holds `∂N_a/∂ξ_k` for every node `a`.
    fn b(&self, xi: &DVector<f64>) -> DMatrix<f64>;

    /// Number of quadrature points
    fn n_int(&self) -> usize {
        self.iweights().len()
    }

    /// Dimension of the reference coordinates
    fn reference_dim(&self) -> usize {
        self.ipoints().first().map_or(0, |p| p.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn all_elements() -> Vec<(&'static str, Box<dyn Element>)> {
        vec![
            ("Bar1", Box::new(Bar1)),
            ("Bar2", Box::new(Bar2)),
            ("Tria1", Box::new(Tria1)),
            ("Quad1", Box::new(Quad1)),
            ("Quad2", Box::new(Quad2)),
            ("Tetra1", Box::new(Tetra1)),
            ("Hexa1", Box::new(Hexa1)),
        ]
    }

    #[test]
    fn shape_functions_partition_unity() {
        for (name, elem) in all_elements() {
            for xi in elem.ipoints() {
                let sum: f64 = elem.n(&xi).iter().sum();
                assert!((sum - 1.0).abs() < 1e-12, "{}: ΣN = {}", name, sum);
            }
        }
    }

    #[test]
    fn gradient_rows_sum_to_zero() {
        for (name, elem) in all_elements() {
            for xi in elem.ipoints() {
                let b = elem.b(&xi);
                assert_eq!(b.nrows(), elem.reference_dim(), "{}", name);
                assert_eq!(b.ncols(), elem.nodes(), "{}", name);
                for k in 0..b.nrows() {
                    let sum: f64 = b.row(k).iter().sum();
                    assert!(sum.abs() < 1e-12, "{}: Σ∂N/∂ξ{} = {}", name, k, sum);
                }
            }
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let h = 1e-6;
        for (name, elem) in all_elements() {
            let dim = elem.reference_dim();
            // off-center point inside every reference domain
            let xi = DVector::from_element(dim, 0.2);
            let b = elem.b(&xi);
            for k in 0..dim {
                let mut plus = xi.clone();
                let mut minus = xi.clone();
                plus[k] += h;
                minus[k] -= h;
                let fd = (elem.n(&plus) - elem.n(&minus)) / (2.0 * h);
                for a in 0..elem.nodes() {
                    assert!(
                        (fd[a] - b[(k, a)]).abs() < 1e-6,
                        "{}: node {} direction {}",
                        name,
                        a,
                        k
                    );
                }
            }
        }
    }

    #[test]
    fn quadrature_rules_are_paired() {
        for (name, elem) in all_elements() {
            assert_eq!(elem.iweights().len(), elem.ipoints().len(), "{}", name);
            assert_eq!(elem.n_int(), elem.ipoints().len(), "{}", name);
        }
    }
}
