//! Solver adapter: presolve, backend dispatch and termination mapping.
//!
//! The adapter borrows a [`Model`] for one solve call and interprets the
//! backend's termination into a tagged [`SolveOutcome`] instead of raising:
//! proven infeasibility and a crashed backend are different things and stay
//! different all the way up to the caller.

mod backend;
pub mod presolve;

use log::{debug, info};

use crate::config::{SolverBackend, SolverConfig};
use crate::error::SolverError;
use crate::model::{Model, VarId};
use crate::solver::presolve::{presolve, Presolve};

/// Variable values of a solved model, indexed by [`VarId`].
///
/// A value of this type only exists once the backend has produced a
/// solution, so results can never be read from an unsolved model.
#[derive(Debug, Clone)]
pub struct SolvedModel {
    values: Vec<f64>,
    pub objective: f64,
}

impl SolvedModel {
    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }
}

/// Tagged solver termination.
#[derive(Debug)]
pub enum SolveOutcome {
    /// Optimality proven within the configured gap.
    Optimal(SolvedModel),
    /// The time limit elapsed first; `best` carries the incumbent when the
    /// backend exposes one.
    TimeLimit { best: Option<SolvedModel> },
    /// No feasible solution exists.
    Infeasible,
}

impl SolveOutcome {
    /// Short status tag for run metadata.
    pub fn status(&self) -> &'static str {
        match self {
            SolveOutcome::Optimal(_) => "Optimal",
            SolveOutcome::TimeLimit { best: Some(_) } => "TimeLimit(best-found)",
            SolveOutcome::TimeLimit { best: None } => "TimeLimit(no-solution)",
            SolveOutcome::Infeasible => "Infeasible",
        }
    }
}

/// Presolve the model and hand it to the configured backend.
pub fn solve(model: &Model, config: &SolverConfig) -> Result<SolveOutcome, SolverError> {
    debug!("[ModelSolver] Presolve initiated...");
    let pre = match presolve(model) {
        Presolve::TriviallyInfeasible { constraint } => {
            info!(
                "[ModelSolver] Constraint '{}' is trivially violated; model is infeasible.",
                constraint
            );
            return Ok(SolveOutcome::Infeasible);
        }
        Presolve::Reduced(pre) => pre,
    };
    info!(
        "[ModelSolver] Presolve removed {} fixed variables and deactivated {} trivial constraints.",
        pre.num_fixed, pre.num_deactivated
    );

    info!(
        "[ModelSolver] Solving '{}' ({}) with backend '{}'...",
        model.name,
        model.size_summary(),
        config.backend
    );
    let outcome = match config.backend {
        SolverBackend::Microlp => backend::solve_microlp(model, &pre, config)?,
        #[cfg(feature = "cbc")]
        SolverBackend::Cbc => backend::solve_cbc(model, &pre, config)?,
        #[cfg(not(feature = "cbc"))]
        SolverBackend::Cbc => return Err(SolverError::BackendUnavailable("cbc")),
    };
    info!("[ModelSolver] Solver completed with status {}.", outcome.status());
    Ok(outcome)
}
