//! Constitutive models for finite element analysis.
//!
//! Materials are evaluated in batches: every input and output matrix has
//! one row per element. A material is *vectorized* when its parameters are
//! stored per element; a scalar-parameter material is broadcast to the
//! element count with [`Material::vectorize`] before a solve.

use crate::error::MaterialError;
use nalgebra::DMatrix;

pub mod elastic;
pub mod plastic;

pub use elastic::{
    IsotropicElasticity1D, IsotropicElasticity3D, IsotropicElasticityPlaneStrain,
    IsotropicElasticityPlaneStress,
};
pub use plastic::IsotropicPlasticity1D;

/// Result of one constitutive update for a batch of elements
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialUpdate {
    /// Updated strain (n_elem × n_strains)
    pub strain: DMatrix<f64>,
    /// Updated stress (n_elem × n_strains)
    pub stress: DMatrix<f64>,
    /// Updated internal state (n_elem × n_state)
    pub state: DMatrix<f64>,
    /// Tangent operator ∂σ/∂ε per element (n_strains × n_strains each)
    pub tangent: Vec<DMatrix<f64>>,
}

/// Stateful, batched constitutive law
pub trait Material: Send + Sync {
    /// Number of strain (and stress) components
    fn n_strains(&self) -> usize;

    /// Length of the internal state vector (0 for path-independent laws)
    fn n_state(&self) -> usize;

    /// Whether parameters are already stored per element
    fn is_vectorized(&self) -> bool;

    /// Number of elements the parameters are stored for, if vectorized
    ///
    /// Fails when per-element parameters disagree in length.
    fn n_elements(&self) -> Result<Option<usize>, MaterialError>;

    /// Copy of this material with parameters broadcast to `n_elem` elements
    fn vectorize(&self, n_elem: usize) -> Self
    where
        Self: Sized;

    /// Advance the material by one strain increment
    ///
    /// `strain_increment`, `strain` and `stress` are n_elem × n_strains;
    /// `state` is n_elem × n_state. `strain`, `stress` and `state` are the
    /// converged values of the previous increment.
    fn step(
        &self,
        strain_increment: &DMatrix<f64>,
        strain: &DMatrix<f64>,
        stress: &DMatrix<f64>,
        state: &DMatrix<f64>,
    ) -> Result<MaterialUpdate, MaterialError>;
}

/// Material parameter, either one scalar or one value per element
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    values: Vec<f64>,
    vectorized: bool,
}

impl Parameter {
    pub fn scalar(value: f64) -> Self {
        Self {
            values: vec![value],
            vectorized: false,
        }
    }

    pub fn per_element(values: Vec<f64>) -> Self {
        Self {
            values,
            vectorized: true,
        }
    }

    /// Value for element `elem`
    pub fn at(&self, elem: usize) -> f64 {
        if self.vectorized {
            self.values[elem]
        } else {
            self.values[0]
        }
    }

    pub fn is_vectorized(&self) -> bool {
        self.vectorized
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Broadcast a scalar to `n_elem` values; vectorized parameters are kept
    pub fn vectorize(&self, n_elem: usize) -> Self {
        if self.vectorized {
            self.clone()
        } else {
            Self::per_element(vec![self.values[0]; n_elem])
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::scalar(value)
    }
}

impl From<Vec<f64>> for Parameter {
    fn from(values: Vec<f64>) -> Self {
        Parameter::per_element(values)
    }
}

/// Common element count of the vectorized parameters in a set
pub(crate) fn batch_size(params: &[&Parameter]) -> Result<Option<usize>, MaterialError> {
    let mut lengths = params.iter().filter(|p| p.is_vectorized()).map(|p| p.len());
    let Some(first) = lengths.next() else {
        return Ok(None);
    };
    match lengths.find(|&len| len != first) {
        Some(other) => Err(MaterialError(format!(
            "per-element parameters have inconsistent lengths {} and {}",
            first, other
        ))),
        None => Ok(Some(first)),
    }
}

/// Check that all step inputs have consistent shapes
pub(crate) fn check_step_shapes(
    n_strains: usize,
    n_state: usize,
    n_elements: Option<usize>,
    strain_increment: &DMatrix<f64>,
    strain: &DMatrix<f64>,
    stress: &DMatrix<f64>,
    state: &DMatrix<f64>,
) -> Result<usize, MaterialError> {
    let n_elem = strain_increment.nrows();
    if let Some(expected) = n_elements {
        if expected != n_elem {
            return Err(MaterialError(format!(
                "material is vectorized for {} elements but received {}",
                expected, n_elem
            )));
        }
    }
    for (name, m, cols) in [
        ("strain increment", strain_increment, n_strains),
        ("strain", strain, n_strains),
        ("stress", stress, n_strains),
        ("state", state, n_state),
    ] {
        if m.nrows() != n_elem || m.ncols() != cols {
            return Err(MaterialError(format!(
                "{} has shape {}x{}, expected {}x{}",
                name,
                m.nrows(),
                m.ncols(),
                n_elem,
                cols
            )));
        }
    }
    Ok(n_elem)
}
