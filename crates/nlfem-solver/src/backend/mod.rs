//! Linear solver backends.
//!
//! The Newton-Raphson driver is written against the [`LinearSolver`] trait
//! and treats every backend as a black box.
//!
//! # Backends
//!
//! - **DenseLu**: expands the CSR matrix to dense storage and factorizes
//!   with nalgebra LU. Handles non-symmetric tangents.
//! - **ConjugateGradient**: Jacobi-preconditioned CG on the CSR matrix.
//!   Symmetric positive definite systems only.
//!
//! ```text
//! Element integration (small dense nalgebra DMatrix)
//!         │
//!         ▼
//! Assembly (COO triplets → CSR + force vector)
//!         │
//!         ▼
//! LinearSolver trait
//!    ┌────┴────┐
//!    ▼         ▼
//! DenseLu   ConjugateGradient
//! ```

pub mod iterative;
pub mod native;
pub mod traits;

pub use iterative::ConjugateGradient;
pub use native::DenseLu;
pub use traits::*;

/// Returns the default linear solver.
pub fn default_backend() -> Box<dyn LinearSolver> {
    Box::new(DenseLu)
}
