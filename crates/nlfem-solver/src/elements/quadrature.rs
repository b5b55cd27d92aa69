//! Gauss quadrature rules on reference elements.
//!
//! Line and tensor-product rules integrate over `[-1, 1]^d`. Simplex rules
//! integrate over the unit simplex with vertices at the origin and the unit
//! axis points.

use nalgebra::DVector;

/// 1D Gauss-Legendre points and weights on [-1, 1]
///
/// Supports 1 to 3 points; other counts fall back to 3.
pub fn gauss_1d(n: usize) -> Vec<(f64, f64)> {
    match n {
        1 => vec![(0.0, 2.0)],
        2 => {
            let p = 1.0 / 3.0_f64.sqrt();
            vec![(-p, 1.0), (p, 1.0)]
        }
        _ => {
            let p = (3.0_f64 / 5.0).sqrt();
            vec![(-p, 5.0 / 9.0), (0.0, 8.0 / 9.0), (p, 5.0 / 9.0)]
        }
    }
}

/// Tensor-product Gauss rule with `n` points per direction in `dim` dimensions
///
/// The first coordinate varies fastest.
pub fn gauss_tensor(n: usize, dim: usize) -> (Vec<DVector<f64>>, Vec<f64>) {
    let line = gauss_1d(n);
    let mut points = vec![Vec::new()];
    let mut weights = vec![1.0];

    for _ in 0..dim {
        let mut next_points = Vec::with_capacity(points.len() * line.len());
        let mut next_weights = Vec::with_capacity(points.len() * line.len());
        for &(x, w) in &line {
            for (p, &pw) in points.iter().zip(weights.iter()) {
                let mut q: Vec<f64> = p.clone();
                q.push(x);
                next_points.push(q);
                next_weights.push(pw * w);
            }
        }
        points = next_points;
        weights = next_weights;
    }

    let points = points.into_iter().map(DVector::from_vec).collect();
    (points, weights)
}

/// One-point centroid rule on the unit simplex of dimension `dim`
pub fn simplex_centroid(dim: usize) -> (Vec<DVector<f64>>, Vec<f64>) {
    let coord = 1.0 / (dim as f64 + 1.0);
    let volume = (1..=dim).fold(1.0, |acc, k| acc / k as f64);
    (vec![DVector::from_element(dim, coord)], vec![volume])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauss_1d_weights_sum_to_interval_length() {
        for n in 1..=3 {
            let sum: f64 = gauss_1d(n).iter().map(|(_, w)| w).sum();
            assert!((sum - 2.0).abs() < 1e-14);
        }
    }

    #[test]
    fn gauss_1d_three_points_integrates_quintic() {
        // ∫ x⁴ dx on [-1, 1] = 2/5
        let integral: f64 = gauss_1d(3).iter().map(|(x, w)| w * x.powi(4)).sum();
        assert!((integral - 0.4).abs() < 1e-14);
    }

    #[test]
    fn tensor_rule_has_expected_size_and_volume() {
        let (points, weights) = gauss_tensor(2, 3);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0].len(), 3);
        let volume: f64 = weights.iter().sum();
        assert!((volume - 8.0).abs() < 1e-14);
    }

    #[test]
    fn simplex_centroid_weights_are_simplex_volumes() {
        let (p2, w2) = simplex_centroid(2);
        assert!((w2[0] - 0.5).abs() < 1e-15);
        assert!((p2[0][0] - 1.0 / 3.0).abs() < 1e-15);

        let (_, w3) = simplex_centroid(3);
        assert!((w3[0] - 1.0 / 6.0).abs() < 1e-15);
    }
}
