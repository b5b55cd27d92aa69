//! Finite element model.
//!
//! Couples a mesh with one element type, one formulation and one batched
//! material, and owns the boundary conditions and external strain that a
//! solve reads. Compatibility between the pieces is checked once here.

use crate::boundary_conditions::BoundaryConditions;
use crate::dof_map::DofMap;
use crate::elements::Element;
use crate::error::{FemError, Result};
use crate::integration::{Integrator, PointFields};
use crate::kinematics::Kinematics;
use crate::materials::Material;
use crate::mesh::Mesh;
use crate::sparse_assembly::assemble_stiffness;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

/// Mesh, collaborators and loading for one analysis
#[derive(Debug, Clone)]
pub struct Model<E, K, M> {
    mesh: Mesh,
    element: E,
    kinematics: K,
    material: M,
    dof_map: DofMap,
    /// Nodal forces, prescribed displacements and constraint flags
    pub bcs: BoundaryConditions,
    /// External strain per element (n_elem × n_strains), scaled per increment
    pub ext_strain: DMatrix<f64>,
}

impl<E: Element, K: Kinematics, M: Material> Model<E, K, M> {
    /// Build a model, vectorizing `material` to the element count if needed
    ///
    /// # Errors
    /// [`FemError::InvalidInput`] if the element node count, reference
    /// dimension or strain count do not fit the mesh and formulation, or if
    /// a vectorized material was built for a different element count.
    pub fn new(mesh: Mesh, element: E, kinematics: K, material: M) -> Result<Self> {
        let n_elem = mesh.n_elements();

        if mesh.nodes_per_element() != element.nodes() {
            return Err(FemError::InvalidInput(format!(
                "mesh elements have {} nodes but the element type has {}",
                mesh.nodes_per_element(),
                element.nodes()
            )));
        }
        if !kinematics.supports(mesh.n_dim(), element.reference_dim()) {
            return Err(FemError::InvalidInput(format!(
                "formulation does not support {}-dimensional elements in {} dimensions",
                element.reference_dim(),
                mesh.n_dim()
            )));
        }
        if material.n_strains() != kinematics.n_strains() {
            return Err(FemError::InvalidInput(format!(
                "material has {} strain components, formulation has {}",
                material.n_strains(),
                kinematics.n_strains()
            )));
        }

        let material = if material.is_vectorized() {
            let batch = material
                .n_elements()
                .map_err(|e| FemError::InvalidInput(format!("material: {}", e.0)))?;
            match batch {
                Some(n) if n != n_elem => {
                    return Err(FemError::InvalidInput(format!(
                        "material is vectorized for {} elements, mesh has {}",
                        n, n_elem
                    )));
                }
                _ => material,
            }
        } else {
            material.vectorize(n_elem)
        };

        let dof_map = DofMap::new(&mesh);
        let bcs = BoundaryConditions::new(mesh.n_nodes(), mesh.n_dim());
        let ext_strain = DMatrix::zeros(n_elem, kinematics.n_strains());

        Ok(Self {
            mesh,
            element,
            kinematics,
            material,
            dof_map,
            bcs,
            ext_strain,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn kinematics(&self) -> &K {
        &self.kinematics
    }

    /// Material, vectorized to the element count
    pub fn material(&self) -> &M {
        &self.material
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    pub fn n_strains(&self) -> usize {
        self.kinematics.n_strains()
    }

    /// Apply the same external strain to every element
    pub fn set_uniform_ext_strain(&mut self, strain: &[f64]) -> Result<()> {
        if strain.len() != self.n_strains() {
            return Err(FemError::InvalidInput(format!(
                "external strain has {} components, expected {}",
                strain.len(),
                self.n_strains()
            )));
        }
        for mut row in self.ext_strain.row_iter_mut() {
            row.copy_from_slice(strain);
        }
        Ok(())
    }

    /// Check loading arrays against the mesh before a solve
    pub fn validate(&self) -> Result<()> {
        self.bcs.validate(self.mesh.n_nodes(), self.mesh.n_dim())?;
        let expected = (self.mesh.n_elements(), self.n_strains());
        if self.ext_strain.shape() != expected {
            return Err(FemError::InvalidInput(format!(
                "external strain has shape {:?}, expected {:?}",
                self.ext_strain.shape(),
                expected
            )));
        }
        Ok(())
    }

    /// Integrator borrowing this model's collaborators
    pub fn integrator(&self) -> Integrator<'_, E, K, M> {
        Integrator {
            mesh: &self.mesh,
            dof_map: &self.dof_map,
            element: &self.element,
            kinematics: &self.kinematics,
            material: &self.material,
        }
    }

    /// Zero-valued integration point history for this model
    pub fn initial_fields(&self) -> PointFields {
        PointFields::zeros(
            self.element.n_int(),
            self.mesh.n_elements(),
            self.n_strains(),
            self.material.n_state(),
        )
    }

    /// Element stiffness blocks at zero strain, stress and state
    pub fn k0(&self) -> Result<Vec<DMatrix<f64>>> {
        let response = self.integrator().integrate(
            &self.initial_fields(),
            &DVector::zeros(self.dof_map.n_dofs()),
            &DMatrix::zeros(self.mesh.n_elements(), self.n_strains()),
            true,
        )?;
        response
            .stiffness
            .ok_or_else(|| FemError::Assembly("integrator returned no stiffness".into()))
    }

    /// Global initial tangent stiffness, without constraint elimination
    pub fn initial_stiffness(&self) -> Result<CsrMatrix<f64>> {
        let blocks = self.k0()?;
        assemble_stiffness(&self.dof_map, &blocks, &vec![false; self.dof_map.n_dofs()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Bar1, Quad1, Tria1};
    use crate::kinematics::{Planar, Solid, Truss};
    use crate::materials::{
        IsotropicElasticity1D, IsotropicElasticityPlaneStress, IsotropicPlasticity1D,
    };
    use crate::sparse_assembly::to_dense;
    use approx::assert_relative_eq;

    fn bar_chain() -> Mesh {
        let nodes = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 3.0]);
        Mesh::new(nodes, vec![vec![0, 1], vec![1, 2]]).unwrap()
    }

    #[test]
    fn scalar_material_is_vectorized() {
        let model = Model::new(bar_chain(), Bar1, Truss::new(1.0), IsotropicElasticity1D::new(5.0))
            .unwrap();
        assert!(model.material().is_vectorized());
        assert_eq!(model.material().n_elements().unwrap(), Some(2));
        assert_eq!(model.ext_strain.shape(), (2, 1));
    }

    #[test]
    fn mismatched_collaborators_are_rejected() {
        let err = Model::new(bar_chain(), Tria1, Truss::new(1.0), IsotropicElasticity1D::new(1.0))
            .unwrap_err();
        assert!(err.to_string().contains("nodes"));

        let err =
            Model::new(bar_chain(), Bar1, Solid, IsotropicElasticity1D::new(1.0)).unwrap_err();
        assert!(matches!(err, FemError::InvalidInput(_)));

        let square = Mesh::new(
            DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]),
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();
        let err = Model::new(square, Quad1, Planar::default(), IsotropicElasticity1D::new(1.0))
            .unwrap_err();
        assert!(err.to_string().contains("strain components"));
    }

    #[test]
    fn wrongly_vectorized_material_is_rejected() {
        let material = IsotropicElasticity1D::new(vec![1.0, 2.0, 3.0]);
        let err = Model::new(bar_chain(), Bar1, Truss::new(1.0), material).unwrap_err();
        assert!(err.to_string().contains("vectorized for 3 elements"));
    }

    #[test]
    fn unequal_parameter_lengths_are_rejected() {
        let nodes = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let mesh = Mesh::new(nodes, vec![vec![0, 1], vec![1, 2], vec![2, 3]]).unwrap();
        let material = IsotropicPlasticity1D::new(vec![1000.0; 3], vec![10.0; 2], 100.0);

        let err = Model::new(mesh, Bar1, Truss::new(1.0), material).unwrap_err();
        assert!(matches!(err, FemError::InvalidInput(_)));
        assert!(err.to_string().contains("inconsistent lengths 3 and 2"));
    }

    #[test]
    fn initial_stiffness_of_bar_chain() {
        let model = Model::new(bar_chain(), Bar1, Truss::new(2.0), IsotropicElasticity1D::new(3.0))
            .unwrap();
        let k = to_dense(&model.initial_stiffness().unwrap());

        // EA/L = 6 and 3
        assert_relative_eq!(k[(0, 0)], 6.0, epsilon = 1e-12);
        assert_relative_eq!(k[(1, 1)], 9.0, epsilon = 1e-12);
        assert_relative_eq!(k[(1, 2)], -3.0, epsilon = 1e-12);
        assert_relative_eq!(k[(0, 2)], 0.0);
    }

    #[test]
    fn uniform_external_strain_fills_every_element() {
        let triangle = Mesh::new(
            DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            vec![vec![0, 1, 2]],
        )
        .unwrap();
        let mut model = Model::new(
            triangle,
            Tria1,
            Planar::default(),
            IsotropicElasticityPlaneStress::new(1.0, 0.2),
        )
        .unwrap();

        model.set_uniform_ext_strain(&[1e-3, 1e-3, 0.0]).unwrap();
        assert_eq!(model.ext_strain[(0, 1)], 1e-3);
        assert!(model.set_uniform_ext_strain(&[1.0]).is_err());

        model.ext_strain = DMatrix::zeros(2, 3);
        assert!(model.validate().is_err());
    }
}
