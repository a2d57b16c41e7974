//! Warehouse-location formulation.
//!
//! Sets: `W` warehouses, `T` townships. Decision variables: `open[w]`
//! binary site selection, `assign[w][t]` continuous supply volume,
//! `despatchers[w][t]` integer crew size per lane. The scenario selects
//! between cost minimisation (demand must be covered) and profit
//! maximisation (demand caps revenue).

use log::{debug, info};

use crate::config::{OptimisationConfig, Scenario};
use crate::data::warehouse::WarehouseInstance;
use crate::error::FormulationError;
use crate::formulation::constants::{BIG_M, DAYS_PER_MONTH};
use crate::model::{Direction, LinExpr, Model, Sense, VarId};

/// The warehouse-location model plus the variable handles the result
/// extractor needs to read a solution back.
#[derive(Debug)]
pub struct WarehouseFormulation {
    pub model: Model,
    /// `open[w]`: warehouse w is opened.
    pub open: Vec<VarId>,
    /// `assign[w][t]`: volume routed from warehouse w to township t.
    pub assign: Vec<Vec<VarId>>,
    /// `despatchers[w][t]`: despatchers hired for that lane.
    pub despatchers: Vec<Vec<VarId>>,
}

/// Monthly trips one despatcher can run on the (w, t) lane.
///
/// Distances are pre-floored, so the round-trip time is never zero.
fn monthly_trip_frequency(distance_km: f64, config: &OptimisationConfig) -> f64 {
    let round_trip_hours = 2.0 * distance_km / config.delivery_speed;
    DAYS_PER_MONTH * config.working_hours_per_day / round_trip_hours
}

/// Build the warehouse-location MIP from an entity snapshot.
pub fn build_warehouse_model(
    instance: &WarehouseInstance,
    config: &OptimisationConfig,
) -> Result<WarehouseFormulation, FormulationError> {
    config.validate()?;

    let num_w = instance.warehouses.len();
    let num_t = instance.townships.len();
    let mut model = Model::new("warehouse-location");

    debug!("[ModelBuilding] Defining decision variables initiated...");
    let open: Vec<VarId> = instance
        .warehouses
        .iter()
        .map(|w| model.add_binary(format!("open_{}", w.name)))
        .collect();

    let assign: Vec<Vec<VarId>> = instance
        .warehouses
        .iter()
        .map(|w| {
            instance
                .townships
                .iter()
                .map(|t| {
                    model.add_continuous(format!("assign_{}_{}", w.name, t.name), 0.0, f64::INFINITY)
                })
                .collect()
        })
        .collect();

    let despatchers: Vec<Vec<VarId>> = instance
        .warehouses
        .iter()
        .enumerate()
        .map(|(w, warehouse)| {
            instance
                .townships
                .iter()
                .enumerate()
                .map(|(t, township)| {
                    // Upper bound: enough crew to ship the whole warehouse
                    // capacity through this lane.
                    let trips = monthly_trip_frequency(instance.distances.get(w, t), config);
                    let crew_cap =
                        (warehouse.capacity / (config.despatch_volume_limit * trips)).ceil() + 1.0;
                    model.add_integer(
                        format!("despatchers_{}_{}", warehouse.name, township.name),
                        0.0,
                        crew_cap,
                    )
                })
                .collect()
        })
        .collect();
    info!("[ModelBuilding] Defining decision variables completed successfully.");

    debug!("[ModelBuilding] Defining objective function initiated...");
    let mut objective = LinExpr::new();

    // Fixed monthly cost of every opened warehouse.
    for (w, warehouse) in instance.warehouses.iter().enumerate() {
        objective.add_term(open[w], warehouse.monthly_cost);
    }

    if config.add_despatcher_hiring_cost {
        for w in 0..num_w {
            for t in 0..num_t {
                objective.add_term(despatchers[w][t], config.despatch_hiring_cost);
            }
        }
    }

    if config.add_delivery_cost {
        // Per-unit delivery cost on a lane: trips are assign / volume_limit,
        // each trip costs round-trip hours times the hourly rate.
        for w in 0..num_w {
            for t in 0..num_t {
                let round_trip_hours = 2.0 * instance.distances.get(w, t) / config.delivery_speed;
                let per_unit = round_trip_hours * config.cost_of_delivery / config.despatch_volume_limit;
                objective.add_term(assign[w][t], per_unit);
            }
        }
    }

    let direction = match config.scenario {
        Scenario::CostMinimization => Direction::Minimise,
        Scenario::ProfitMaximization => {
            // Revenue enters positively; the cost terms accumulated above
            // are flipped so the whole expression is maximised.
            for (_, coeff) in objective.terms.iter_mut() {
                *coeff = -*coeff;
            }
            for w in 0..num_w {
                for t in 0..num_t {
                    objective.add_term(assign[w][t], config.profit_per_sales_volume);
                }
            }
            Direction::Maximise
        }
    };
    model.set_objective(direction, objective);
    info!("[ModelBuilding] Defining objective function completed successfully.");

    debug!("[ModelBuilding] Defining constraints initiated...");
    // Activation: nothing ships from a closed warehouse.
    for (w, warehouse) in instance.warehouses.iter().enumerate() {
        let mut expr = LinExpr::new();
        for t in 0..num_t {
            expr.add_term(assign[w][t], 1.0);
        }
        expr.add_term(open[w], -BIG_M);
        model.add_constraint(format!("activation_{}", warehouse.name), expr, Sense::Le, 0.0);
    }

    // Capacity: total outbound volume within storage capacity.
    for (w, warehouse) in instance.warehouses.iter().enumerate() {
        let mut expr = LinExpr::new();
        for t in 0..num_t {
            expr.add_term(assign[w][t], 1.0);
        }
        model.add_constraint(
            format!("capacity_{}", warehouse.name),
            expr,
            Sense::Le,
            warehouse.capacity,
        );
    }

    // Demand: covered in the cost scenario, capped in the profit scenario
    // so revenue cannot be manufactured beyond real demand.
    let demand_sense = match config.scenario {
        Scenario::CostMinimization => Sense::Ge,
        Scenario::ProfitMaximization => Sense::Le,
    };
    for (t, township) in instance.townships.iter().enumerate() {
        let mut expr = LinExpr::new();
        for w in 0..num_w {
            expr.add_term(assign[w][t], 1.0);
        }
        model.add_constraint(
            format!("demand_{}", township.name),
            expr,
            demand_sense,
            township.demand,
        );
    }

    // Despatcher sizing: enough crew on the lane to move the assigned
    // volume at the lane's monthly trip frequency.
    for (w, warehouse) in instance.warehouses.iter().enumerate() {
        for (t, township) in instance.townships.iter().enumerate() {
            let trips = monthly_trip_frequency(instance.distances.get(w, t), config);
            let mut expr = LinExpr::new();
            expr.add_term(despatchers[w][t], config.despatch_volume_limit * trips);
            expr.add_term(assign[w][t], -1.0);
            model.add_constraint(
                format!("despatch_sizing_{}_{}", warehouse.name, township.name),
                expr,
                Sense::Ge,
                0.0,
            );
        }
    }

    // Optional ceiling on one-way delivery time for every opened warehouse.
    if config.add_delivery_time_constraint {
        for (w, warehouse) in instance.warehouses.iter().enumerate() {
            for (t, township) in instance.townships.iter().enumerate() {
                let hours = instance.distances.get(w, t) / config.delivery_speed;
                let expr = LinExpr::term(open[w], hours);
                model.add_constraint(
                    format!("delivery_time_{}_{}", warehouse.name, township.name),
                    expr,
                    Sense::Le,
                    config.maximum_delivery_hrs_constraint,
                );
            }
        }
    }
    info!("[ModelBuilding] Defining constraints completed successfully.");

    info!("[ModelBuilding] Warehouse model built: {}", model.size_summary());
    Ok(WarehouseFormulation { model, open, assign, despatchers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::warehouse::{load_townships, load_warehouses};
    use crate::data::{TownshipRow, WarehouseRow};
    use crate::model::VarType;

    fn instance() -> WarehouseInstance {
        let warehouses = load_warehouses(
            &[
                WarehouseRow {
                    name: "North".to_string(),
                    latitude: 3.2,
                    longitude: 101.6,
                    area_sqft: Some(100.0),
                    monthly_cost: Some(1000.0),
                },
                WarehouseRow {
                    name: "South".to_string(),
                    latitude: 2.9,
                    longitude: 101.7,
                    area_sqft: Some(50.0),
                    monthly_cost: Some(500.0),
                },
            ],
            1.0,
        )
        .unwrap();
        let townships = load_townships(
            &[
                TownshipRow {
                    township: "Subang".to_string(),
                    district: "Petaling".to_string(),
                    latitude: 3.05,
                    longitude: 101.58,
                    proportion_sales: Some(2.0),
                },
                TownshipRow {
                    township: "Kajang".to_string(),
                    district: "Hulu Langat".to_string(),
                    latitude: 2.99,
                    longitude: 101.79,
                    proportion_sales: Some(1.0),
                },
            ],
            120.0,
        )
        .unwrap();
        WarehouseInstance::new(warehouses, townships, 0.001)
    }

    #[test]
    fn variable_layout_matches_sets() {
        let formulation =
            build_warehouse_model(&instance(), &OptimisationConfig::default()).unwrap();

        // 2 binary opens, 4 continuous assignments, 4 integer crews.
        assert_eq!(formulation.model.num_variables(), 10);
        assert_eq!(formulation.open.len(), 2);
        assert_eq!(formulation.assign.len(), 2);
        assert_eq!(formulation.assign[0].len(), 2);
        assert_eq!(
            formulation.model.variable(formulation.open[0]).var_type,
            VarType::Binary
        );
        assert_eq!(
            formulation.model.variable(formulation.despatchers[1][1]).var_type,
            VarType::Integer
        );
    }

    #[test]
    fn activation_constraints_use_big_m() {
        let formulation =
            build_warehouse_model(&instance(), &OptimisationConfig::default()).unwrap();
        let activation = formulation
            .model
            .constraints
            .iter()
            .find(|c| c.name == "activation_North")
            .unwrap();

        let open_term = activation
            .expr
            .terms
            .iter()
            .find(|(var, _)| *var == formulation.open[0])
            .unwrap();
        assert_eq!(open_term.1, -BIG_M);
        assert_eq!(activation.sense, Sense::Le);
    }

    #[test]
    fn demand_sense_flips_with_scenario() {
        let cost = build_warehouse_model(&instance(), &OptimisationConfig::default()).unwrap();
        let profit = build_warehouse_model(
            &instance(),
            &OptimisationConfig {
                scenario: Scenario::ProfitMaximization,
                ..OptimisationConfig::default()
            },
        )
        .unwrap();

        let sense_of = |f: &WarehouseFormulation| {
            f.model
                .constraints
                .iter()
                .find(|c| c.name == "demand_Subang")
                .unwrap()
                .sense
        };
        assert_eq!(sense_of(&cost), Sense::Ge);
        assert_eq!(sense_of(&profit), Sense::Le);
        assert_eq!(cost.model.direction, Direction::Minimise);
        assert_eq!(profit.model.direction, Direction::Maximise);
    }

    #[test]
    fn delivery_time_constraints_follow_the_toggle() {
        let with = build_warehouse_model(&instance(), &OptimisationConfig::default()).unwrap();
        let without = build_warehouse_model(
            &instance(),
            &OptimisationConfig {
                add_delivery_time_constraint: false,
                ..OptimisationConfig::default()
            },
        )
        .unwrap();

        let count = |f: &WarehouseFormulation| {
            f.model
                .constraints
                .iter()
                .filter(|c| c.name.starts_with("delivery_time_"))
                .count()
        };
        assert_eq!(count(&with), 4);
        assert_eq!(count(&without), 0);
    }

    #[test]
    fn despatcher_sizing_is_finite_for_collocated_pair() {
        let warehouses = load_warehouses(
            &[WarehouseRow {
                name: "Here".to_string(),
                latitude: 3.0,
                longitude: 101.5,
                area_sqft: Some(100.0),
                monthly_cost: Some(100.0),
            }],
            1.0,
        )
        .unwrap();
        let townships = load_townships(
            &[TownshipRow {
                township: "Same Spot".to_string(),
                district: "Petaling".to_string(),
                latitude: 3.0,
                longitude: 101.5,
                proportion_sales: Some(1.0),
            }],
            50.0,
        )
        .unwrap();
        let instance = WarehouseInstance::new(warehouses, townships, 0.001);
        let formulation =
            build_warehouse_model(&instance, &OptimisationConfig::default()).unwrap();

        let sizing = formulation
            .model
            .constraints
            .iter()
            .find(|c| c.name.starts_with("despatch_sizing_"))
            .unwrap();
        let crew_coeff = sizing
            .expr
            .terms
            .iter()
            .find(|(var, _)| *var == formulation.despatchers[0][0])
            .unwrap()
            .1;
        assert!(crew_coeff.is_finite());
        assert!(crew_coeff > 0.0);
    }
}
