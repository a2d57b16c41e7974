//! One optimisation run, end to end.
//!
//! Entities in, tables out: build the formulation, hand it to the solver
//! adapter, extract results, attach run metadata. Each run owns a fresh
//! formulation built from an immutable instance snapshot; nothing is
//! retried and nothing is recovered silently.

use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{OptimisationConfig, SolverConfig};
use crate::data::routing::RoutingInstance;
use crate::data::warehouse::WarehouseInstance;
use crate::error::{InfeasibleModelError, PipelineError, SolverError};
use crate::formulation::{build_routing_model, build_warehouse_model};
use crate::results::{
    extract_routing_results, extract_warehouse_results, RoutingResults, WarehouseResults,
};
use crate::solver::{solve, SolveOutcome};

/// Solver status and timing attached to every successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub solver_status: String,
    pub duration_secs: f64,
    pub objective: f64,
    pub solved_at: DateTime<Utc>,
}

/// Tables plus metadata from a warehouse-location run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseRunOutput {
    pub results: WarehouseResults,
    pub metadata: RunMetadata,
}

/// Tables plus metadata from a technician-routing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRunOutput {
    pub results: RoutingResults,
    pub metadata: RunMetadata,
}

/// Run the warehouse-location profile on one instance snapshot.
pub fn optimise_warehouses(
    instance: &WarehouseInstance,
    config: &OptimisationConfig,
    solver_config: &SolverConfig,
) -> Result<WarehouseRunOutput, PipelineError> {
    let start = Instant::now();
    debug!("[OptimisationModel] Warehouse-location run initiated...");

    let formulation = build_warehouse_model(instance, config)?;
    match solve(&formulation.model, solver_config)? {
        SolveOutcome::Optimal(solved) => {
            let results = extract_warehouse_results(&formulation, instance, &solved);
            let metadata = RunMetadata {
                solver_status: "Optimal".to_string(),
                duration_secs: start.elapsed().as_secs_f64(),
                objective: solved.objective,
                solved_at: Utc::now(),
            };
            info!(
                "[OptimisationModel] completed successfully in {:.3}s (objective {:.2}).",
                metadata.duration_secs, metadata.objective
            );
            Ok(WarehouseRunOutput { results, metadata })
        }
        SolveOutcome::TimeLimit { best } => {
            Err(SolverError::TimeLimit { best_found: best.is_some() }.into())
        }
        SolveOutcome::Infeasible => {
            Err(InfeasibleModelError { model: formulation.model.name.clone() }.into())
        }
    }
}

/// Run the technician-routing profile on one instance snapshot.
pub fn optimise_routes(
    instance: &RoutingInstance,
    solver_config: &SolverConfig,
) -> Result<RoutingRunOutput, PipelineError> {
    let start = Instant::now();
    debug!("[OptimisationModel] Technician-routing run initiated...");

    let formulation = build_routing_model(instance)?;
    match solve(&formulation.model, solver_config)? {
        SolveOutcome::Optimal(solved) => {
            let results = extract_routing_results(&formulation, instance, &solved);
            let metadata = RunMetadata {
                solver_status: "Optimal".to_string(),
                duration_secs: start.elapsed().as_secs_f64(),
                objective: solved.objective,
                solved_at: Utc::now(),
            };
            info!(
                "[OptimisationModel] completed successfully in {:.3}s (objective {:.2}).",
                metadata.duration_secs, metadata.objective
            );
            Ok(RoutingRunOutput { results, metadata })
        }
        SolveOutcome::TimeLimit { best } => {
            Err(SolverError::TimeLimit { best_found: best.is_some() }.into())
        }
        SolveOutcome::Infeasible => {
            Err(InfeasibleModelError { model: formulation.model.name.clone() }.into())
        }
    }
}
