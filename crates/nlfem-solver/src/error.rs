//! Error types for nlfem-solver

use crate::backend::BackendError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FemError>;

/// Failure reported by a material model during a constitutive update.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct MaterialError(pub String);

impl From<&str> for MaterialError {
    fn from(s: &str) -> Self {
        MaterialError(s.to_string())
    }
}

#[derive(Error, Debug)]
pub enum FemError {
    #[error("Negative Jacobian in element {element} (det J = {det:.3e}). Check element numbering.")]
    NegativeJacobian { element: usize, det: f64 },

    #[error(
        "Newton-Raphson iteration did not converge in increment {increment} \
         after {iterations} iterations (residual = {residual:.3e})"
    )]
    NotConverged {
        increment: usize,
        iterations: usize,
        residual: f64,
    },

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("Linear solver error: {0}")]
    LinearSolver(#[from] BackendError),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Assembly error: {0}")]
    Assembly(String),
}
