//! Configuration for one optimisation run.
//!
//! Both bundles are plain values handed to the builder and the solver
//! adapter at construction time; there is no process-wide settings object.
//! Defaults mirror the planning parameters the original datasets were
//! calibrated against.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, FormulationError};
use crate::formulation::constants::DEFAULT_DISTANCE_FLOOR_KM;

/// Objective-function variant for the warehouse-location profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Open warehouses and cover all township demand at minimum cost.
    CostMinimization,
    /// Maximise sales profit minus the same cost terms; demand becomes an
    /// upper bound so no artificial revenue can be manufactured.
    ProfitMaximization,
}

impl Scenario {
    /// Resolve the numeric scenario id used by the external configuration
    /// surface (1 = cost minimisation, 2 = profit maximisation).
    pub fn from_id(id: u32) -> Result<Self, FormulationError> {
        match id {
            1 => Ok(Scenario::CostMinimization),
            2 => Ok(Scenario::ProfitMaximization),
            other => Err(FormulationError::UnknownScenario(other)),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Scenario::CostMinimization => 1,
            Scenario::ProfitMaximization => 2,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::CostMinimization => write!(f, "100% demand coverage"),
            Scenario::ProfitMaximization => write!(f, "maximise profit"),
        }
    }
}

/// Parameter bundle consumed by the formulation builder.
///
/// Distances are kilometres, speeds km/h, times hours, costs and profits in
/// the planning currency per unit or per hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimisationConfig {
    pub scenario: Scenario,
    /// Cap the one-way delivery time of every opened warehouse.
    pub add_delivery_time_constraint: bool,
    /// Include despatcher hiring cost in the objective.
    pub add_despatcher_hiring_cost: bool,
    /// Include per-trip delivery cost in the objective.
    pub add_delivery_cost: bool,
    /// Total system demand distributed over townships by proportion of sales.
    pub total_demand: f64,
    /// Monthly cost of one despatcher.
    pub despatch_hiring_cost: f64,
    /// Average delivery speed in km/h.
    pub delivery_speed: f64,
    /// Volume one despatcher can move per trip.
    pub despatch_volume_limit: f64,
    /// Delivery cost per hour on the road.
    pub cost_of_delivery: f64,
    pub working_hours_per_day: f64,
    /// One-way delivery time ceiling in hours, used when
    /// `add_delivery_time_constraint` is set.
    pub maximum_delivery_hrs_constraint: f64,
    /// Profit per unit of sales volume (profit-maximisation scenario).
    pub profit_per_sales_volume: f64,
    /// Storage height used to derive warehouse capacity from floor area.
    pub warehouse_storage_height: f64,
    /// Minimum distance substituted for any warehouse-township pair before
    /// the distance is used as a divisor.
    pub distance_floor_km: f64,
}

impl Default for OptimisationConfig {
    fn default() -> Self {
        OptimisationConfig {
            scenario: Scenario::CostMinimization,
            add_delivery_time_constraint: true,
            add_despatcher_hiring_cost: false,
            add_delivery_cost: true,
            total_demand: 100_000.0,
            despatch_hiring_cost: 2_000.0,
            delivery_speed: 60.0,
            despatch_volume_limit: 20.0,
            cost_of_delivery: 3.0,
            working_hours_per_day: 12.0,
            maximum_delivery_hrs_constraint: 3.0,
            profit_per_sales_volume: 10.0,
            warehouse_storage_height: 1.0,
            distance_floor_km: DEFAULT_DISTANCE_FLOOR_KM,
        }
    }
}

impl OptimisationConfig {
    /// Load a parameter bundle from a JSON file; absent fields keep their
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path)?;
        let config: OptimisationConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Reject parameter values the formulation cannot use, before any
    /// variable is created.
    pub fn validate(&self) -> Result<(), FormulationError> {
        fn positive(name: &'static str, value: f64) -> Result<(), FormulationError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(FormulationError::InvalidParameter {
                    name,
                    value,
                    reason: "must be a positive finite number",
                })
            }
        }

        positive("delivery_speed", self.delivery_speed)?;
        positive("despatch_volume_limit", self.despatch_volume_limit)?;
        positive("working_hours_per_day", self.working_hours_per_day)?;
        positive("distance_floor_km", self.distance_floor_km)?;
        positive("warehouse_storage_height", self.warehouse_storage_height)?;
        if self.total_demand < 0.0 || !self.total_demand.is_finite() {
            return Err(FormulationError::InvalidParameter {
                name: "total_demand",
                value: self.total_demand,
                reason: "must be non-negative and finite",
            });
        }
        if self.add_delivery_time_constraint {
            positive("maximum_delivery_hrs_constraint", self.maximum_delivery_hrs_constraint)?;
        }
        Ok(())
    }
}

/// Identity of the external MIP solver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Pure-Rust branch-and-bound solver, always available.
    Microlp,
    /// COIN-OR CBC, available when built with the `cbc` feature.
    Cbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Microlp => write!(f, "microlp"),
            SolverBackend::Cbc => write!(f, "cbc"),
        }
    }
}

/// Branch-and-bound node selection strategy (CBC `nodeStrategy` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStrategy {
    Hybrid,
    Fewest,
    Depth,
}

impl NodeStrategy {
    pub fn as_cbc_option(self) -> &'static str {
        match self {
            NodeStrategy::Hybrid => "hybrid",
            NodeStrategy::Fewest => "fewest",
            NodeStrategy::Depth => "depth",
        }
    }
}

/// Solver identity and numeric tolerances for one solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Relative MIP gap at which the backend may stop.
    pub ratio_gap: f64,
    /// Wall-clock limit in seconds.
    pub time_limit_secs: f64,
    pub node_strategy: NodeStrategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            backend: SolverBackend::Microlp,
            ratio_gap: 0.01,
            time_limit_secs: 600.0,
            node_strategy: NodeStrategy::Hybrid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_ids_round_trip() {
        assert_eq!(Scenario::from_id(1).unwrap(), Scenario::CostMinimization);
        assert_eq!(Scenario::from_id(2).unwrap(), Scenario::ProfitMaximization);
        assert_eq!(Scenario::ProfitMaximization.id(), 2);
    }

    #[test]
    fn unknown_scenario_id_is_rejected() {
        assert!(matches!(
            Scenario::from_id(7),
            Err(FormulationError::UnknownScenario(7))
        ));
    }

    #[test]
    fn default_config_validates() {
        assert!(OptimisationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_speed_is_rejected() {
        let config = OptimisationConfig {
            delivery_speed: 0.0,
            ..OptimisationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FormulationError::InvalidParameter { name: "delivery_speed", .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let parsed: OptimisationConfig =
            serde_json::from_str(r#"{"scenario": "profit_maximization", "total_demand": 500.0}"#)
                .unwrap();
        assert_eq!(parsed.scenario, Scenario::ProfitMaximization);
        assert_eq!(parsed.total_demand, 500.0);
        assert_eq!(parsed.delivery_speed, 60.0);
    }
}
