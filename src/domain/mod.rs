// Domain module: scheduling entities, value objects, diagnostics, and the
// solver service contract

pub mod diagnostics;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use diagnostics::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
