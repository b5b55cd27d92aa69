//! Uniaxial elasto-plasticity with linear isotropic hardening.
//!
//! Yield function f = |σ| − (σ_y + H q), where q is the equivalent plastic
//! strain carried as the single internal state variable. The return
//! mapping is closed-form and the tangent is the consistent elasto-plastic
//! modulus E H / (E + H) on plastic loading.

use super::{batch_size, check_step_shapes, Material, MaterialUpdate, Parameter};
use crate::error::MaterialError;
use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct IsotropicPlasticity1D {
    /// Young's modulus (E)
    pub e: Parameter,
    /// Initial yield stress (σ_y)
    pub sigma_y: Parameter,
    /// Linear hardening modulus (H)
    pub hardening: Parameter,
}

impl IsotropicPlasticity1D {
    pub fn new(
        e: impl Into<Parameter>,
        sigma_y: impl Into<Parameter>,
        hardening: impl Into<Parameter>,
    ) -> Self {
        Self {
            e: e.into(),
            sigma_y: sigma_y.into(),
            hardening: hardening.into(),
        }
    }
}

impl Material for IsotropicPlasticity1D {
    fn n_strains(&self) -> usize {
        1
    }

    fn n_state(&self) -> usize {
        1
    }

    fn is_vectorized(&self) -> bool {
        self.e.is_vectorized() || self.sigma_y.is_vectorized() || self.hardening.is_vectorized()
    }

    fn n_elements(&self) -> Result<Option<usize>, MaterialError> {
        batch_size(&[&self.e, &self.sigma_y, &self.hardening])
    }

    fn vectorize(&self, n_elem: usize) -> Self {
        Self {
            e: self.e.vectorize(n_elem),
            sigma_y: self.sigma_y.vectorize(n_elem),
            hardening: self.hardening.vectorize(n_elem),
        }
    }

    fn step(
        &self,
        strain_increment: &DMatrix<f64>,
        strain: &DMatrix<f64>,
        stress: &DMatrix<f64>,
        state: &DMatrix<f64>,
    ) -> Result<MaterialUpdate, MaterialError> {
        let n_elem = check_step_shapes(
            1,
            1,
            self.n_elements()?,
            strain_increment,
            strain,
            stress,
            state,
        )?;

        let new_strain = strain + strain_increment;
        let mut new_stress = DMatrix::zeros(n_elem, 1);
        let mut new_state = DMatrix::zeros(n_elem, 1);
        let mut tangent = Vec::with_capacity(n_elem);

        for e in 0..n_elem {
            let (modulus, sigma_y, h) = (self.e.at(e), self.sigma_y.at(e), self.hardening.at(e));
            if sigma_y < 0.0 {
                return Err(MaterialError(format!(
                    "negative yield stress {} in element {}",
                    sigma_y, e
                )));
            }
            if modulus + h <= 0.0 {
                return Err(MaterialError(format!(
                    "E + H must be positive in element {} (E = {}, H = {})",
                    e, modulus, h
                )));
            }

            let q = state[(e, 0)];
            let sigma_trial = stress[(e, 0)] + modulus * strain_increment[(e, 0)];
            let f = sigma_trial.abs() - (sigma_y + h * q);

            if f > 0.0 {
                let dgamma = f / (modulus + h);
                new_stress[(e, 0)] = sigma_trial - modulus * dgamma * sigma_trial.signum();
                new_state[(e, 0)] = q + dgamma;
                tangent.push(DMatrix::from_element(1, 1, modulus * h / (modulus + h)));
            } else {
                new_stress[(e, 0)] = sigma_trial;
                new_state[(e, 0)] = q;
                tangent.push(DMatrix::from_element(1, 1, modulus));
            }
        }

        Ok(MaterialUpdate {
            strain: new_strain,
            stress: new_stress,
            state: new_state,
            tangent,
        })
    }
}
