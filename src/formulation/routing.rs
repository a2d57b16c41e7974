//! Technician-routing formulation.
//!
//! Sets: `K` technicians, `C` customers, `L` locations, `D` depots.
//! A customer is either assigned to one eligible technician or declared a
//! gap; assigned customers are visited on a tour that starts and ends at
//! the technician's own depot, with service start times propagated along
//! traversed arcs and time-window deviations absorbed by slack variables.

use log::{debug, info};

use crate::data::routing::RoutingInstance;
use crate::error::FormulationError;
use crate::formulation::constants::{SCHEDULE_HORIZON, UNFILLED_JOB_PENALTY, WINDOW_SLACK_WEIGHT};
use crate::model::{Direction, LinExpr, Model, Sense, VarId};

/// The routing model plus the variable handles the result extractor needs.
#[derive(Debug)]
pub struct RoutingFormulation {
    pub model: Model,
    /// `assignment[c][k]`: customer c is served by technician k.
    pub assignment: Vec<Vec<VarId>>,
    /// `active[k]`: technician k leaves the depot at all.
    pub active: Vec<VarId>,
    /// `arcs[i][j][k]`: technician k travels from location i to location j.
    pub arcs: Vec<Vec<Vec<VarId>>>,
    /// `start_time[l]`: service start at location l.
    pub start_time: Vec<VarId>,
    /// `lateness[c]`: completion past the due time.
    pub lateness: Vec<VarId>,
    /// `early_slack[c]` / `late_slack[c]`: window corrections.
    pub early_slack: Vec<VarId>,
    pub late_slack: Vec<VarId>,
    /// `gap[c]`: customer c is left unserved.
    pub gap: Vec<VarId>,
}

/// Build the technician-routing MIP from an entity snapshot.
pub fn build_routing_model(
    instance: &RoutingInstance,
) -> Result<RoutingFormulation, FormulationError> {
    let num_k = instance.technicians.len();
    let num_l = instance.distances.len();
    let depots = instance.depots();
    let customer_locations = instance.customer_locations();

    let mut model = Model::new("technician-routing");

    debug!("[ModelBuilding] Defining decision variables initiated...");
    let assignment: Vec<Vec<VarId>> = instance
        .customers
        .iter()
        .map(|c| {
            instance
                .technicians
                .iter()
                .map(|k| model.add_binary(format!("assign_{}_{}", c.name, k.name)))
                .collect()
        })
        .collect();

    let active: Vec<VarId> = instance
        .technicians
        .iter()
        .map(|k| model.add_binary(format!("active_{}", k.name)))
        .collect();

    let arcs: Vec<Vec<Vec<VarId>>> = (0..num_l)
        .map(|i| {
            (0..num_l)
                .map(|j| {
                    instance
                        .technicians
                        .iter()
                        .map(|k| {
                            model.add_binary(format!(
                                "arc_{}_{}_{}",
                                instance.distances.location_name(i),
                                instance.distances.location_name(j),
                                k.name
                            ))
                        })
                        .collect()
                })
                .collect()
        })
        .collect();

    let start_time: Vec<VarId> = (0..num_l)
        .map(|l| {
            model.add_continuous(
                format!("start_{}", instance.distances.location_name(l)),
                0.0,
                f64::INFINITY,
            )
        })
        .collect();

    let lateness: Vec<VarId> = instance
        .customers
        .iter()
        .map(|c| model.add_continuous(format!("late_{}", c.name), 0.0, f64::INFINITY))
        .collect();
    let early_slack: Vec<VarId> = instance
        .customers
        .iter()
        .map(|c| model.add_continuous(format!("early_corr_{}", c.name), 0.0, f64::INFINITY))
        .collect();
    let late_slack: Vec<VarId> = instance
        .customers
        .iter()
        .map(|c| model.add_continuous(format!("late_corr_{}", c.name), 0.0, f64::INFINITY))
        .collect();
    let gap: Vec<VarId> = instance
        .customers
        .iter()
        .map(|c| model.add_binary(format!("gap_{}", c.name)))
        .collect();
    info!("[ModelBuilding] Defining decision variables completed successfully.");

    // Arc fixing. Self-arcs never help a tour; a technician may only touch
    // its own depot; a technician outside a job's coverage can never take
    // it. Fixed variables are removed by presolve before the backend runs.
    for l in 0..num_l {
        for k in 0..num_k {
            model.fix(arcs[l][l][k], 0.0);
        }
    }
    for (k, technician) in instance.technicians.iter().enumerate() {
        for &d in &depots {
            if d != technician.depot {
                for i in 0..num_l {
                    model.fix(arcs[i][d][k], 0.0);
                    model.fix(arcs[d][i][k], 0.0);
                }
            }
        }
    }
    for (c, customer) in instance.customers.iter().enumerate() {
        let covered_by = &instance.jobs[customer.job].covered_by;
        for k in 0..num_k {
            if !covered_by.contains(&k) {
                model.fix(assignment[c][k], 0.0);
            }
        }
    }

    debug!("[ModelBuilding] Defining objective function initiated...");
    let mut objective = LinExpr::new();
    for (c, customer) in instance.customers.iter().enumerate() {
        let priority = instance.jobs[customer.job].priority;
        objective.add_term(lateness[c], priority);
        let slack_weight = WINDOW_SLACK_WEIGHT * UNFILLED_JOB_PENALTY * priority;
        objective.add_term(early_slack[c], slack_weight);
        objective.add_term(late_slack[c], slack_weight);
        objective.add_term(gap[c], UNFILLED_JOB_PENALTY * priority);
    }
    model.set_objective(Direction::Minimise, objective);
    info!("[ModelBuilding] Defining objective function completed successfully.");

    debug!("[ModelBuilding] Defining constraints initiated...");
    // A customer is served by an eligible technician or declared a gap.
    for (c, customer) in instance.customers.iter().enumerate() {
        let mut expr = LinExpr::new();
        for &k in &instance.jobs[customer.job].covered_by {
            expr.add_term(assignment[c][k], 1.0);
        }
        expr.add_term(gap[c], 1.0);
        model.add_constraint(format!("assign_or_gap_{}", customer.name), expr, Sense::Eq, 1.0);
    }

    // At most one technician per customer.
    for (c, customer) in instance.customers.iter().enumerate() {
        let mut expr = LinExpr::new();
        for k in 0..num_k {
            expr.add_term(assignment[c][k], 1.0);
        }
        model.add_constraint(format!("single_technician_{}", customer.name), expr, Sense::Le, 1.0);
    }

    // Capacity: service time plus travel time within the workload cap of
    // an active technician.
    for (k, technician) in instance.technicians.iter().enumerate() {
        let mut expr = LinExpr::new();
        for (c, customer) in instance.customers.iter().enumerate() {
            expr.add_term(assignment[c][k], instance.jobs[customer.job].duration);
        }
        for i in 0..num_l {
            for j in 0..num_l {
                if i != j {
                    expr.add_term(arcs[i][j][k], instance.distances.get(i, j));
                }
            }
        }
        expr.add_term(active[k], -technician.capacity);
        model.add_constraint(format!("capacity_{}", technician.name), expr, Sense::Le, 0.0);
    }

    // Flow conservation: a served customer's location is entered and left
    // exactly once by the serving technician.
    for (c, customer) in instance.customers.iter().enumerate() {
        for (k, technician) in instance.technicians.iter().enumerate() {
            let mut inbound = LinExpr::new();
            let mut outbound = LinExpr::new();
            for l in 0..num_l {
                inbound.add_term(arcs[l][customer.location][k], 1.0);
                outbound.add_term(arcs[customer.location][l][k], 1.0);
            }
            inbound.add_term(assignment[c][k], -1.0);
            outbound.add_term(assignment[c][k], -1.0);
            model.add_constraint(
                format!("tour_in_{}_{}", customer.name, technician.name),
                inbound,
                Sense::Eq,
                0.0,
            );
            model.add_constraint(
                format!("tour_out_{}_{}", customer.name, technician.name),
                outbound,
                Sense::Eq,
                0.0,
            );
        }
    }

    // An active technician's tour closes at its own depot.
    for (k, technician) in instance.technicians.iter().enumerate() {
        let mut into_depot = LinExpr::new();
        let mut out_of_depot = LinExpr::new();
        for &j in &customer_locations {
            into_depot.add_term(arcs[j][technician.depot][k], 1.0);
            out_of_depot.add_term(arcs[technician.depot][j][k], 1.0);
        }
        into_depot.add_term(active[k], -1.0);
        out_of_depot.add_term(active[k], -1.0);
        model.add_constraint(
            format!("depot_return_{}", technician.name),
            into_depot,
            Sense::Eq,
            0.0,
        );
        model.add_constraint(
            format!("depot_departure_{}", technician.name),
            out_of_depot,
            Sense::Eq,
            0.0,
        );
    }

    // Temporal propagation between customer locations: traversing an arc
    // forces the downstream start after the upstream service and travel.
    for from in instance.customers.iter() {
        for to in instance.customers.iter() {
            if from.location == to.location {
                continue;
            }
            let duration = instance.jobs[from.job].duration;
            let travel = instance.distances.get(from.location, to.location);
            let big_m = SCHEDULE_HORIZON + duration + travel;

            let mut expr = LinExpr::new();
            expr.add_term(start_time[to.location], 1.0);
            expr.add_term(start_time[from.location], -1.0);
            for k in 0..num_k {
                expr.add_term(arcs[from.location][to.location][k], -big_m);
            }
            model.add_constraint(
                format!("temporal_{}_{}", from.name, to.name),
                expr,
                Sense::Ge,
                duration + travel - big_m,
            );
        }
    }

    // Temporal propagation out of depots.
    for customer in instance.customers.iter() {
        for &d in &depots {
            if d == customer.location {
                continue;
            }
            let travel = instance.distances.get(d, customer.location);
            let big_m = SCHEDULE_HORIZON + travel;

            let mut expr = LinExpr::new();
            expr.add_term(start_time[customer.location], 1.0);
            expr.add_term(start_time[d], -1.0);
            for k in 0..num_k {
                expr.add_term(arcs[d][customer.location][k], -big_m);
            }
            model.add_constraint(
                format!(
                    "temporal_depot_{}_{}",
                    instance.distances.location_name(d),
                    customer.name
                ),
                expr,
                Sense::Ge,
                travel - big_m,
            );
        }
    }

    // Time windows with correction slacks.
    for (c, customer) in instance.customers.iter().enumerate() {
        let mut open = LinExpr::new();
        open.add_term(start_time[customer.location], 1.0);
        open.add_term(early_slack[c], 1.0);
        model.add_constraint(
            format!("window_open_{}", customer.name),
            open,
            Sense::Ge,
            customer.window_start,
        );

        let mut close = LinExpr::new();
        close.add_term(start_time[customer.location], 1.0);
        close.add_term(late_slack[c], -1.0);
        model.add_constraint(
            format!("window_close_{}", customer.name),
            close,
            Sense::Le,
            customer.window_end,
        );
    }

    // Lateness: completion past the due time.
    for (c, customer) in instance.customers.iter().enumerate() {
        let duration = instance.jobs[customer.job].duration;
        let mut expr = LinExpr::new();
        expr.add_term(lateness[c], 1.0);
        expr.add_term(start_time[customer.location], -1.0);
        model.add_constraint(
            format!("lateness_{}", customer.name),
            expr,
            Sense::Ge,
            duration - customer.due_time,
        );
    }
    info!("[ModelBuilding] Defining constraints completed successfully.");

    info!("[ModelBuilding] Routing model built: {}", model.size_summary());
    Ok(RoutingFormulation {
        model,
        assignment,
        active,
        arcs,
        start_time,
        lateness,
        early_slack,
        late_slack,
        gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::routing::{
        load_customers, load_jobs, load_technicians, DistanceMatrix, RoutingInstance,
    };
    use crate::data::{CustomerRow, DistanceRow, JobRow, TechnicianRow};

    fn pair(a: &str, b: &str, d: f64) -> DistanceRow {
        DistanceRow {
            location_a: a.to_string(),
            location_b: b.to_string(),
            distance: d,
        }
    }

    fn instance() -> RoutingInstance {
        let distances = DistanceMatrix::from_pairs(&[
            pair("depot_a", "depot_b", 20.0),
            pair("depot_a", "site_1", 10.0),
            pair("depot_a", "site_2", 15.0),
            pair("depot_b", "site_1", 12.0),
            pair("depot_b", "site_2", 8.0),
            pair("site_1", "site_2", 6.0),
        ])
        .unwrap();
        let technicians = load_technicians(
            &[
                TechnicianRow {
                    name: "Aishah".to_string(),
                    capacity: 480.0,
                    depot: "depot_a".to_string(),
                },
                TechnicianRow {
                    name: "Farid".to_string(),
                    capacity: 240.0,
                    depot: "depot_b".to_string(),
                },
            ],
            &distances,
        )
        .unwrap();
        let jobs = load_jobs(
            &[
                JobRow {
                    name: "Commissioning".to_string(),
                    priority: 2.0,
                    duration: 60.0,
                    covered_by: "Aishah".to_string(),
                },
                JobRow {
                    name: "Inspection".to_string(),
                    priority: 1.0,
                    duration: 30.0,
                    covered_by: "Aishah;Farid".to_string(),
                },
            ],
            &technicians,
        )
        .unwrap();
        let customers = load_customers(
            &[
                CustomerRow {
                    name: "C1".to_string(),
                    location: "site_1".to_string(),
                    job: "Commissioning".to_string(),
                    window_start: 0.0,
                    window_end: 300.0,
                    due_time: 360.0,
                },
                CustomerRow {
                    name: "C2".to_string(),
                    location: "site_2".to_string(),
                    job: "Inspection".to_string(),
                    window_start: 60.0,
                    window_end: 420.0,
                    due_time: 480.0,
                },
            ],
            &jobs,
            &distances,
        )
        .unwrap();
        RoutingInstance { technicians, jobs, customers, distances }
    }

    #[test]
    fn foreign_depot_arcs_are_fixed_to_zero() {
        let instance = instance();
        let formulation = build_routing_model(&instance).unwrap();

        let depot_b = instance.distances.location_index("depot_b").unwrap();
        let site_1 = instance.distances.location_index("site_1").unwrap();

        // Aishah (technician 0) is based at depot_a, so arcs touching
        // depot_b are fixed for her, while Farid keeps his.
        let foreign = formulation.model.variable(formulation.arcs[depot_b][site_1][0]);
        assert!(foreign.is_fixed());
        assert_eq!(foreign.upper, 0.0);
        assert!(!formulation.model.variable(formulation.arcs[depot_b][site_1][1]).is_fixed());
    }

    #[test]
    fn self_arcs_are_fixed_to_zero() {
        let instance = instance();
        let formulation = build_routing_model(&instance).unwrap();
        for l in 0..instance.distances.len() {
            for k in 0..instance.technicians.len() {
                assert!(formulation.model.variable(formulation.arcs[l][l][k]).is_fixed());
            }
        }
    }

    #[test]
    fn ineligible_assignments_are_fixed_to_zero() {
        let instance = instance();
        let formulation = build_routing_model(&instance).unwrap();
        // C1 needs Commissioning, which only Aishah covers.
        let farid = formulation.model.variable(formulation.assignment[0][1]);
        assert!(farid.is_fixed());
        assert!(!formulation.model.variable(formulation.assignment[0][0]).is_fixed());
    }

    #[test]
    fn uncoverable_customer_forces_the_gap_indicator() {
        let mut instance = instance();
        instance.jobs[0].covered_by.clear();
        let formulation = build_routing_model(&instance).unwrap();

        let constraint = formulation
            .model
            .constraints
            .iter()
            .find(|c| c.name == "assign_or_gap_C1")
            .unwrap();
        // Only the gap indicator is left on the left-hand side, so the
        // equality pins it to 1.
        assert_eq!(constraint.expr.terms.len(), 1);
        assert_eq!(constraint.expr.terms[0].0, formulation.gap[0]);
        assert_eq!(constraint.sense, Sense::Eq);
        assert_eq!(constraint.rhs, 1.0);
    }

    #[test]
    fn temporal_big_m_relaxes_untraversed_arcs() {
        let instance = instance();
        let formulation = build_routing_model(&instance).unwrap();
        let temporal = formulation
            .model
            .constraints
            .iter()
            .find(|c| c.name == "temporal_C1_C2")
            .unwrap();

        // dur(C1) = 60, dist(site_1, site_2) = 6.
        let big_m = SCHEDULE_HORIZON + 60.0 + 6.0;
        assert_eq!(temporal.rhs, 60.0 + 6.0 - big_m);
        let site_1 = instance.distances.location_index("site_1").unwrap();
        let site_2 = instance.distances.location_index("site_2").unwrap();
        for k in 0..instance.technicians.len() {
            let coeff = temporal
                .expr
                .terms
                .iter()
                .find(|(var, _)| *var == formulation.arcs[site_1][site_2][k])
                .unwrap()
                .1;
            assert_eq!(coeff, -big_m);
        }
    }
}
