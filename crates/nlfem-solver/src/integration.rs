//! Element integration.
//!
//! For one trial displacement increment, evaluates every element at every
//! quadrature point: geometric Jacobian, physical gradients, strain
//! increment, material update, and the weighted stiffness and internal
//! force contributions. Work at a quadrature point is done for all
//! elements at once; per-element loops run in parallel with rayon and are
//! collected in element order, so results do not depend on scheduling.

use crate::dof_map::DofMap;
use crate::elements::Element;
use crate::error::{FemError, Result};
use crate::kinematics::Kinematics;
use crate::materials::{Material, MaterialUpdate};
use crate::mesh::Mesh;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Strain, stress and internal state at every integration point
///
/// Each vector has one entry per integration point holding an
/// n_elem × n_components matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFields {
    pub strain: Vec<DMatrix<f64>>,
    pub stress: Vec<DMatrix<f64>>,
    pub state: Vec<DMatrix<f64>>,
}

impl PointFields {
    pub fn zeros(n_int: usize, n_elem: usize, n_strains: usize, n_state: usize) -> Self {
        Self {
            strain: vec![DMatrix::zeros(n_elem, n_strains); n_int],
            stress: vec![DMatrix::zeros(n_elem, n_strains); n_int],
            state: vec![DMatrix::zeros(n_elem, n_state); n_int],
        }
    }

    pub fn n_int(&self) -> usize {
        self.strain.len()
    }
}

/// Element-wise mean of per-point matrices
///
/// An empty slice gives a 0 × 0 matrix.
pub fn mean_over_points(points: &[DMatrix<f64>]) -> DMatrix<f64> {
    let Some((first, rest)) = points.split_first() else {
        return DMatrix::zeros(0, 0);
    };
    let sum = rest.iter().fold(first.clone(), |acc, m| acc + m);
    sum / points.len() as f64
}

/// Output of one integration pass
#[derive(Debug, Clone)]
pub struct ElementResponse {
    /// Local stiffness blocks, present when stiffness was requested
    pub stiffness: Option<Vec<DMatrix<f64>>>,
    /// Local internal force vectors
    pub force: Vec<DVector<f64>>,
    /// Updated integration point fields
    pub fields: PointFields,
}

/// Geometric Jacobian of the isoparametric map for one element
///
/// Line parametrizations (one reference direction) use half the length of
/// the first edge.
pub fn jacobian(b: &DMatrix<f64>, coords: &DMatrix<f64>) -> DMatrix<f64> {
    if b.nrows() == 1 {
        let edge = coords.row(1) - coords.row(0);
        DMatrix::from_element(1, 1, 0.5 * edge.norm())
    } else {
        b * coords
    }
}

/// Batched element integrator over a mesh
pub struct Integrator<'a, E: ?Sized, K: ?Sized, M: ?Sized> {
    pub mesh: &'a Mesh,
    pub dof_map: &'a DofMap,
    pub element: &'a E,
    pub kinematics: &'a K,
    pub material: &'a M,
}

impl<E, K, M> Integrator<'_, E, K, M>
where
    E: Element + ?Sized,
    K: Kinematics + ?Sized,
    M: Material + ?Sized,
{
    /// Integrate all elements for a trial displacement increment
    ///
    /// * `previous` - converged fields of the previous increment
    /// * `du` - trial displacement increment (global DOF vector)
    /// * `de0` - prescribed external strain increment (n_elem × n_strains)
    /// * `compute_stiffness` - whether to build local stiffness blocks
    ///
    /// # Errors
    /// [`FemError::NegativeJacobian`] if any element has det J ≤ 0 at a
    /// quadrature point; material errors are passed through.
    pub fn integrate(
        &self,
        previous: &PointFields,
        du: &DVector<f64>,
        de0: &DMatrix<f64>,
        compute_stiffness: bool,
    ) -> Result<ElementResponse> {
        let n_elem = self.mesh.n_elements();
        let n_strains = self.kinematics.n_strains();
        let n_local = self.dof_map.local_size();
        let weights = self.element.iweights();
        let points = self.element.ipoints();

        if previous.n_int() != points.len() {
            return Err(FemError::InvalidInput(format!(
                "history has {} integration points, element has {}",
                previous.n_int(),
                points.len()
            )));
        }

        let coords: Vec<DMatrix<f64>> = (0..n_elem)
            .into_par_iter()
            .map(|e| self.mesh.element_coords(e))
            .collect();
        let du_local: Vec<DVector<f64>> = (0..n_elem)
            .into_par_iter()
            .map(|e| {
                let dofs = self.dof_map.element_dofs(e);
                DVector::from_iterator(dofs.len(), dofs.iter().map(|&dof| du[dof]))
            })
            .collect();

        let n_state = self.material.n_state();
        let mut fields = PointFields::zeros(points.len(), n_elem, n_strains, n_state);
        let mut force = vec![DVector::zeros(n_local); n_elem];
        let mut stiffness =
            compute_stiffness.then(|| vec![DMatrix::zeros(n_local, n_local); n_elem]);

        for (i, (w, xi)) in weights.iter().zip(points.iter()).enumerate() {
            let b_ref = self.element.b(xi);

            let geometry: Vec<Result<(f64, DMatrix<f64>)>> = coords
                .par_iter()
                .enumerate()
                .map(|(e, x)| {
                    let j = jacobian(&b_ref, x);
                    let det = j.determinant();
                    if det <= 0.0 {
                        return Err(FemError::NegativeJacobian { element: e, det });
                    }
                    let j_inv = j
                        .try_inverse()
                        .ok_or(FemError::NegativeJacobian { element: e, det })?;
                    let b = j_inv * &b_ref;
                    Ok((det, self.kinematics.strain_operator(&b, x)))
                })
                .collect();
            let geometry: Vec<(f64, DMatrix<f64>)> = geometry.into_iter().collect::<Result<_>>()?;

            let mut de = DMatrix::zeros(n_elem, n_strains);
            for (e, (_, d)) in geometry.iter().enumerate() {
                let strain = (d * &du_local[e]).transpose() - de0.row(e);
                de.set_row(e, &strain);
            }

            let update = self.material.step(
                &de,
                &previous.strain[i],
                &previous.stress[i],
                &previous.state[i],
            )?;
            check_update(&update, n_elem, n_strains, n_state)?;

            let contributions: Vec<(DVector<f64>, Option<DMatrix<f64>>)> = geometry
                .par_iter()
                .enumerate()
                .map(|(e, (det_j, d))| {
                    let sigma = update.stress.row(e).transpose();
                    let f = self.kinematics.compute_f(*det_j, d, &sigma) * *w;
                    let k = compute_stiffness.then(|| {
                        let dcd = d.tr_mul(&(&update.tangent[e] * d));
                        self.kinematics.compute_k(*det_j, &dcd) * *w
                    });
                    (f, k)
                })
                .collect();

            for (e, (f, k)) in contributions.into_iter().enumerate() {
                force[e] += f;
                if let (Some(blocks), Some(k)) = (stiffness.as_mut(), k) {
                    blocks[e] += k;
                }
            }

            fields.strain[i] = update.strain;
            fields.stress[i] = update.stress;
            fields.state[i] = update.state;
        }

        Ok(ElementResponse {
            stiffness,
            force,
            fields,
        })
    }
}

/// Reject a material update whose outputs do not match the batch
fn check_update(
    update: &MaterialUpdate,
    n_elem: usize,
    n_strains: usize,
    n_state: usize,
) -> Result<()> {
    for (name, m, cols) in [
        ("strain", &update.strain, n_strains),
        ("stress", &update.stress, n_strains),
        ("state", &update.state, n_state),
    ] {
        if m.shape() != (n_elem, cols) {
            return Err(FemError::InvalidInput(format!(
                "material returned {} of shape {:?}, expected ({}, {})",
                name,
                m.shape(),
                n_elem,
                cols
            )));
        }
    }
    if update.tangent.len() != n_elem {
        return Err(FemError::InvalidInput(format!(
            "material returned {} tangents for {} elements",
            update.tangent.len(),
            n_elem
        )));
    }
    if let Some(e) = update
        .tangent
        .iter()
        .position(|c| c.shape() != (n_strains, n_strains))
    {
        return Err(FemError::InvalidInput(format!(
            "material tangent of element {} has shape {:?}, expected ({}, {})",
            e,
            update.tangent[e].shape(),
            n_strains,
            n_strains
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Bar1, Tria1};
    use crate::error::MaterialError;
    use crate::kinematics::{Planar, Truss};
    use crate::materials::{IsotropicElasticity1D, IsotropicElasticityPlaneStress};
    use approx::assert_relative_eq;

    fn bar_mesh(length: f64) -> Mesh {
        Mesh::new(DMatrix::from_row_slice(2, 1, &[0.0, length]), vec![vec![0, 1]]).unwrap()
    }

    fn triangle_mesh(connectivity: Vec<usize>) -> Mesh {
        let nodes = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 2.0, 0.0, 0.0, 1.0]);
        Mesh::new(nodes, vec![connectivity]).unwrap()
    }

    #[test]
    fn bar_stiffness_is_ea_over_l() {
        let mesh = bar_mesh(2.0);
        let map = DofMap::new(&mesh);
        let material = IsotropicElasticity1D::new(100.0).vectorize(1);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Bar1,
            kinematics: &Truss::new(0.5),
            material: &material,
        };

        let history = PointFields::zeros(1, 1, 1, 0);
        let response = integrator
            .integrate(&history, &DVector::zeros(2), &DMatrix::zeros(1, 1), true)
            .unwrap();

        let k = &response.stiffness.unwrap()[0];
        let ea_l = 100.0 * 0.5 / 2.0;
        assert_relative_eq!(k[(0, 0)], ea_l, epsilon = 1e-12);
        assert_relative_eq!(k[(0, 1)], -ea_l, epsilon = 1e-12);
        assert_relative_eq!(k[(1, 1)], ea_l, epsilon = 1e-12);
    }

    #[test]
    fn bar_internal_force_balances_stretch() {
        let mesh = bar_mesh(2.0);
        let map = DofMap::new(&mesh);
        let material = IsotropicElasticity1D::new(100.0).vectorize(1);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Bar1,
            kinematics: &Truss::new(1.0),
            material: &material,
        };

        let history = PointFields::zeros(1, 1, 1, 0);
        let du = DVector::from_vec(vec![0.0, 0.02]);
        let response = integrator
            .integrate(&history, &du, &DMatrix::zeros(1, 1), false)
            .unwrap();

        assert!(response.stiffness.is_none());
        assert_relative_eq!(response.fields.strain[0][(0, 0)], 0.01, epsilon = 1e-14);
        assert_relative_eq!(response.fields.stress[0][(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(response.force[0][0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(response.force[0][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn external_strain_is_subtracted() {
        let mesh = bar_mesh(1.0);
        let map = DofMap::new(&mesh);
        let material = IsotropicElasticity1D::new(10.0).vectorize(1);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Bar1,
            kinematics: &Truss::new(1.0),
            material: &material,
        };

        let history = PointFields::zeros(1, 1, 1, 0);
        let du = DVector::from_vec(vec![0.0, 0.003]);
        let de0 = DMatrix::from_element(1, 1, 0.003);
        let response = integrator.integrate(&history, &du, &de0, false).unwrap();
        assert_relative_eq!(response.fields.stress[0][(0, 0)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn triangle_stiffness_is_symmetric_with_rigid_body_modes() {
        let mesh = triangle_mesh(vec![0, 1, 2]);
        let map = DofMap::new(&mesh);
        let material = IsotropicElasticityPlaneStress::new(1000.0, 0.3).vectorize(1);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Tria1,
            kinematics: &Planar::default(),
            material: &material,
        };

        let history = PointFields::zeros(1, 1, 3, 0);
        let response = integrator
            .integrate(&history, &DVector::zeros(6), &DMatrix::zeros(1, 3), true)
            .unwrap();
        let k = &response.stiffness.unwrap()[0];

        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9);

        let translation = DVector::from_vec(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert!((k * translation).norm() < 1e-9);
        // small rotation about the origin: u = (-y, x)
        let rotation = DVector::from_vec(vec![0.0, 0.0, 0.0, 2.0, -1.0, 0.0]);
        assert!((k * rotation).norm() < 1e-9);
    }

    #[test]
    fn clockwise_triangle_has_negative_jacobian() {
        let mesh = triangle_mesh(vec![0, 2, 1]);
        let map = DofMap::new(&mesh);
        let material = IsotropicElasticityPlaneStress::new(1000.0, 0.3).vectorize(1);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Tria1,
            kinematics: &Planar::default(),
            material: &material,
        };

        let history = PointFields::zeros(1, 1, 3, 0);
        let err = integrator
            .integrate(&history, &DVector::zeros(6), &DMatrix::zeros(1, 3), true)
            .unwrap_err();
        assert!(matches!(err, FemError::NegativeJacobian { element: 0, .. }));
    }

    /// Elastic bar law that hands back its stress transposed
    struct TransposedStress;

    impl Material for TransposedStress {
        fn n_strains(&self) -> usize {
            1
        }

        fn n_state(&self) -> usize {
            0
        }

        fn is_vectorized(&self) -> bool {
            true
        }

        fn n_elements(&self) -> std::result::Result<Option<usize>, MaterialError> {
            Ok(None)
        }

        fn vectorize(&self, _n_elem: usize) -> Self {
            TransposedStress
        }

        fn step(
            &self,
            strain_increment: &DMatrix<f64>,
            strain: &DMatrix<f64>,
            stress: &DMatrix<f64>,
            state: &DMatrix<f64>,
        ) -> std::result::Result<MaterialUpdate, MaterialError> {
            let n_elem = strain_increment.nrows();
            Ok(MaterialUpdate {
                strain: strain + strain_increment,
                stress: (stress + strain_increment).transpose(),
                state: state.clone(),
                tangent: vec![DMatrix::identity(1, 1); n_elem],
            })
        }
    }

    #[test]
    fn misshaped_material_output_is_an_error() {
        let nodes = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        let mesh = Mesh::new(nodes, vec![vec![0, 1], vec![1, 2]]).unwrap();
        let map = DofMap::new(&mesh);
        let integrator = Integrator {
            mesh: &mesh,
            dof_map: &map,
            element: &Bar1,
            kinematics: &Truss::new(1.0),
            material: &TransposedStress,
        };

        let history = PointFields::zeros(1, 2, 1, 0);
        let err = integrator
            .integrate(&history, &DVector::zeros(3), &DMatrix::zeros(2, 1), true)
            .unwrap_err();
        assert!(matches!(err, FemError::InvalidInput(_)));
        assert!(err.to_string().contains("stress of shape (1, 2)"));
    }

    #[test]
    fn averaging_takes_mean_over_points() {
        let mut fields = PointFields::zeros(2, 1, 1, 0);
        fields.stress[0][(0, 0)] = 1.0;
        fields.stress[1][(0, 0)] = 3.0;
        let stress = mean_over_points(&fields.stress);
        let state = mean_over_points(&fields.state);
        assert_eq!(stress[(0, 0)], 2.0);
        assert_eq!(state.shape(), (1, 0));
        assert_eq!(mean_over_points(&[]).shape(), (0, 0));
    }
}
