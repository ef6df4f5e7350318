use crate::domain::{solver_service::SolverService, value_objects::SolverBackend};
use crate::solver::MicrolpSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend. Backends that were not
    /// compiled in fall back to microlp with a warning, so a run never
    /// aborts over a missing native library.
    pub fn create(backend: SolverBackend) -> Arc<dyn SolverService> {
        match backend {
            SolverBackend::Auto | SolverBackend::Microlp => Arc::new(MicrolpSolver::new()),

            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Arc::new(crate::solver::CoinCbcSolver::new()),
            #[cfg(not(feature = "coin_cbc"))]
            SolverBackend::CoinCbc => {
                log::warn!("COIN-OR CBC backend not compiled in; falling back to microlp");
                Arc::new(MicrolpSolver::new())
            }

            #[cfg(feature = "highs")]
            SolverBackend::Highs => Arc::new(crate::solver::HighsSolver::new()),
            #[cfg(not(feature = "highs"))]
            SolverBackend::Highs => {
                log::warn!("HiGHS backend not compiled in; falling back to microlp");
                Arc::new(MicrolpSolver::new())
            }
        }
    }

    /// Get the default solver (microlp)
    pub fn default_solver() -> Arc<dyn SolverService> {
        Arc::new(MicrolpSolver::new())
    }
}
