//! Incremental nonlinear finite element solver.
//!
//! A [`Model`] couples a [`Mesh`] with an isoparametric element type, a
//! problem formulation ([`kinematics`]) and a batched, possibly
//! history-dependent constitutive law ([`materials`]). The
//! [`NonlinearSolver`] drives it through a sequence of load factors with
//! Newton-Raphson iteration:
//!
//! ```text
//! DofMap (local → global DOF table, stiffness pairs)
//!         │
//!         ▼
//! Integrator (Jacobian, B, D, material step, k and f per element)
//!         │
//!         ▼
//! Assembly (COO → CSR, constraint elimination, force scatter)
//!         │
//!         ▼
//! LinearSolver (DenseLu | ConjugateGradient)
//! ```

pub mod backend;
pub mod boundary_conditions;
pub mod dof_map;
pub mod elements;
pub mod error;
pub mod integration;
pub mod kinematics;
pub mod materials;
pub mod mesh;
pub mod model;
pub mod nonlinear_solver;
pub mod sparse_assembly;

pub use backend::{
    default_backend, BackendError, ConjugateGradient, DenseLu, LinearSolver, SolveInfo,
};
pub use boundary_conditions::{dofs_to_nodal, nodal_to_dofs, BoundaryConditions};
pub use dof_map::DofMap;
pub use elements::{Bar1, Bar2, Element, Hexa1, Quad1, Quad2, Tetra1, Tria1};
pub use error::{FemError, MaterialError, Result};
pub use integration::{ElementResponse, Integrator, PointFields};
pub use kinematics::{Kinematics, Planar, Solid, Truss};
pub use materials::{
    IsotropicElasticity1D, IsotropicElasticity3D, IsotropicElasticityPlaneStrain,
    IsotropicElasticityPlaneStress, IsotropicPlasticity1D, Material, MaterialUpdate, Parameter,
};
pub use mesh::Mesh;
pub use model::Model;
pub use nonlinear_solver::{
    IncrementResult, NonlinearConfig, NonlinearResults, NonlinearSolver, PointField,
    StiffnessCache,
};
pub use sparse_assembly::{assemble_force, assemble_stiffness};
