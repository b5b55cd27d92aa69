//! Isotropic linear elastic materials.
//!
//! Strains use engineering shear components (Voigt notation). Stress is
//! updated incrementally, σ_new = σ_old + C Δε, so prescribed initial
//! stresses carry through. None of these laws has internal state.

use super::{batch_size, check_step_shapes, Material, MaterialUpdate, Parameter};
use crate::error::MaterialError;
use nalgebra::DMatrix;

/// Incremental update shared by all linear elastic laws
fn elastic_step(
    n_strains: usize,
    n_elements: Option<usize>,
    tangent_at: impl Fn(usize) -> DMatrix<f64>,
    strain_increment: &DMatrix<f64>,
    strain: &DMatrix<f64>,
    stress: &DMatrix<f64>,
    state: &DMatrix<f64>,
) -> Result<MaterialUpdate, MaterialError> {
    let n_elem = check_step_shapes(
        n_strains,
        0,
        n_elements,
        strain_increment,
        strain,
        stress,
        state,
    )?;

    let new_strain = strain + strain_increment;
    let mut new_stress = stress.clone();
    let mut tangent = Vec::with_capacity(n_elem);

    for e in 0..n_elem {
        let c = tangent_at(e);
        let ds = &c * strain_increment.row(e).transpose();
        let sigma = stress.row(e) + ds.transpose();
        new_stress.set_row(e, &sigma);
        tangent.push(c);
    }

    Ok(MaterialUpdate {
        strain: new_strain,
        stress: new_stress,
        state: DMatrix::zeros(n_elem, 0),
        tangent,
    })
}

/// Uniaxial linear elasticity (1 strain component)
#[derive(Debug, Clone, PartialEq)]
pub struct IsotropicElasticity1D {
    /// Young's modulus (E)
    pub e: Parameter,
}

impl IsotropicElasticity1D {
    pub fn new(e: impl Into<Parameter>) -> Self {
        Self { e: e.into() }
    }
}

impl Material for IsotropicElasticity1D {
    fn n_strains(&self) -> usize {
        1
    }

    fn n_state(&self) -> usize {
        0
    }

    fn is_vectorized(&self) -> bool {
        self.e.is_vectorized()
    }

    fn n_elements(&self) -> Result<Option<usize>, MaterialError> {
        batch_size(&[&self.e])
    }

    fn vectorize(&self, n_elem: usize) -> Self {
        Self {
            e: self.e.vectorize(n_elem),
        }
    }

    fn step(
        &self,
        strain_increment: &DMatrix<f64>,
        strain: &DMatrix<f64>,
        stress: &DMatrix<f64>,
        state: &DMatrix<f64>,
    ) -> Result<MaterialUpdate, MaterialError> {
        elastic_step(
            1,
            self.n_elements()?,
            |e| DMatrix::from_element(1, 1, self.e.at(e)),
            strain_increment,
            strain,
            stress,
            state,
        )
    }
}

macro_rules! isotropic_elastic_material {
    ($(#[$doc:meta])* $name:ident, $n_strains:expr, $tangent:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            /// Young's modulus (E)
            pub e: Parameter,
            /// Poisson's ratio (ν)
            pub nu: Parameter,
        }

        impl $name {
            pub fn new(e: impl Into<Parameter>, nu: impl Into<Parameter>) -> Self {
                Self {
                    e: e.into(),
                    nu: nu.into(),
                }
            }

            /// Elastic stiffness matrix of element `elem`
            pub fn stiffness(&self, elem: usize) -> DMatrix<f64> {
                $tangent(self.e.at(elem), self.nu.at(elem))
            }
        }

        impl Material for $name {
            fn n_strains(&self) -> usize {
                $n_strains
            }

            fn n_state(&self) -> usize {
                0
            }

            fn is_vectorized(&self) -> bool {
                self.e.is_vectorized() || self.nu.is_vectorized()
            }

            fn n_elements(&self) -> Result<Option<usize>, MaterialError> {
                batch_size(&[&self.e, &self.nu])
            }

            fn vectorize(&self, n_elem: usize) -> Self {
                Self {
                    e: self.e.vectorize(n_elem),
                    nu: self.nu.vectorize(n_elem),
                }
            }

            fn step(
                &self,
                strain_increment: &DMatrix<f64>,
                strain: &DMatrix<f64>,
                stress: &DMatrix<f64>,
                state: &DMatrix<f64>,
            ) -> Result<MaterialUpdate, MaterialError> {
                elastic_step(
                    $n_strains,
                    self.n_elements()?,
                    |e| self.stiffness(e),
                    strain_increment,
                    strain,
                    stress,
                    state,
                )
            }
        }
    };
}

/// Plane stress stiffness, strains [εxx, εyy, γxy]
fn plane_stress_tangent(e: f64, nu: f64) -> DMatrix<f64> {
    let factor = e / (1.0 - nu * nu);
    DMatrix::from_row_slice(
        3,
        3,
        &[
            factor,
            factor * nu,
            0.0,
            factor * nu,
            factor,
            0.0,
            0.0,
            0.0,
            factor * 0.5 * (1.0 - nu),
        ],
    )
}

/// Plane strain stiffness, strains [εxx, εyy, γxy]
fn plane_strain_tangent(e: f64, nu: f64) -> DMatrix<f64> {
    let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
    DMatrix::from_row_slice(
        3,
        3,
        &[
            factor * (1.0 - nu),
            factor * nu,
            0.0,
            factor * nu,
            factor * (1.0 - nu),
            0.0,
            0.0,
            0.0,
            factor * 0.5 * (1.0 - 2.0 * nu),
        ],
    )
}

/// 3D stiffness, strains [εxx, εyy, εzz, γxy, γyz, γzx]
///
/// ```text
///       [1-ν   ν     ν     0       0       0    ]
///       [ν     1-ν   ν     0       0       0    ]
///   E   [ν     ν     1-ν   0       0       0    ]
/// ───── [0     0     0   (1-2ν)/2  0       0    ]
/// (1+ν)(1-2ν)
///       [0     0     0     0     (1-2ν)/2  0    ]
///       [0     0     0     0       0     (1-2ν)/2]
/// ```
fn solid_tangent(e: f64, nu: f64) -> DMatrix<f64> {
    let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
    let diagonal = 1.0 - nu;
    let shear = (1.0 - 2.0 * nu) / 2.0;

    let mut c = DMatrix::zeros(6, 6);
    for i in 0..3 {
        for j in 0..3 {
            c[(i, j)] = factor * if i == j { diagonal } else { nu };
        }
        c[(i + 3, i + 3)] = shear * factor;
    }
    c
}

isotropic_elastic_material!(
    /// Plane stress isotropic elasticity (3 strain components)
    IsotropicElasticityPlaneStress,
    3,
    plane_stress_tangent
);

isotropic_elastic_material!(
    /// Plane strain isotropic elasticity (3 strain components)
    IsotropicElasticityPlaneStrain,
    3,
    plane_strain_tangent
);

isotropic_elastic_material!(
    /// Three-dimensional isotropic elasticity (6 strain components)
    IsotropicElasticity3D,
    6,
    solid_tangent
);
