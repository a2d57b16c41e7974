//! Result extraction: solved variable values back into tabular outputs.
//!
//! Extraction takes a [`SolvedModel`], which only exists once the solver
//! adapter has confirmed a solution, so reading values from an infeasible
//! or unsolved model is unrepresentable rather than merely forbidden.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::routing::RoutingInstance;
use crate::data::warehouse::WarehouseInstance;
use crate::formulation::{RoutingFormulation, WarehouseFormulation};
use crate::solver::SolvedModel;

/// Threshold above which a relaxed binary counts as switched on.
const BINARY_THRESHOLD: f64 = 0.5;

/// Below this magnitude a slack or lateness value is reported as zero.
const VALUE_TOL: f64 = 1e-6;

/// One row of the warehouse selection table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseSelectionRow {
    pub name: String,
    pub selected: bool,
}

/// One cell of the warehouse-township assignment matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub warehouse: String,
    pub township: String,
    pub volume: f64,
}

/// One cell of the despatcher requirement matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DespatcherRow {
    pub warehouse: String,
    pub township: String,
    pub despatchers: u32,
}

/// The three tabular outputs of a warehouse-location run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseResults {
    pub selection: Vec<WarehouseSelectionRow>,
    pub assignments: Vec<AssignmentRow>,
    pub despatchers: Vec<DespatcherRow>,
}

impl WarehouseResults {
    pub fn is_selected(&self, warehouse: &str) -> Option<bool> {
        self.selection.iter().find(|r| r.name == warehouse).map(|r| r.selected)
    }

    pub fn assigned_volume(&self, warehouse: &str, township: &str) -> Option<f64> {
        self.assignments
            .iter()
            .find(|r| r.warehouse == warehouse && r.township == township)
            .map(|r| r.volume)
    }

    /// Total volume shipped into one township across all warehouses.
    pub fn township_volume(&self, township: &str) -> f64 {
        self.assignments
            .iter()
            .filter(|r| r.township == township)
            .map(|r| r.volume)
            .sum()
    }

    /// Total volume shipped out of one warehouse across all townships.
    pub fn warehouse_volume(&self, warehouse: &str) -> f64 {
        self.assignments
            .iter()
            .filter(|r| r.warehouse == warehouse)
            .map(|r| r.volume)
            .sum()
    }
}

/// Read the warehouse-location solution into its three tables.
pub fn extract_warehouse_results(
    formulation: &WarehouseFormulation,
    instance: &WarehouseInstance,
    solved: &SolvedModel,
) -> WarehouseResults {
    debug!("[PostProcessing] Warehouses' selection detail is as such:");
    let selection: Vec<WarehouseSelectionRow> = instance
        .warehouses
        .iter()
        .enumerate()
        .map(|(w, warehouse)| {
            let selected = solved.value(formulation.open[w]) > BINARY_THRESHOLD;
            debug!("--> Warehouse: {} | Selected: {}", warehouse.name, selected);
            WarehouseSelectionRow { name: warehouse.name.clone(), selected }
        })
        .collect();

    let mut assignments = Vec::with_capacity(instance.warehouses.len() * instance.townships.len());
    let mut despatchers = Vec::with_capacity(assignments.capacity());
    for (w, warehouse) in instance.warehouses.iter().enumerate() {
        for (t, township) in instance.townships.iter().enumerate() {
            assignments.push(AssignmentRow {
                warehouse: warehouse.name.clone(),
                township: township.name.clone(),
                volume: solved.value(formulation.assign[w][t]),
            });
            despatchers.push(DespatcherRow {
                warehouse: warehouse.name.clone(),
                township: township.name.clone(),
                despatchers: solved.value(formulation.despatchers[w][t]).round().max(0.0) as u32,
            });
        }
    }

    WarehouseResults { selection, assignments, despatchers }
}

/// One row of the per-customer assignment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAssignmentRow {
    pub customer: String,
    pub job: String,
    pub location: String,
    /// Serving technician, `None` when the customer resolved to a gap.
    pub technician: Option<String>,
    pub start_time: Option<f64>,
    pub lateness: f64,
    pub start_correction: f64,
    pub end_correction: f64,
}

/// Reconstructed tour of one technician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianRoute {
    pub technician: String,
    pub used: bool,
    /// Visited locations from depot back to depot.
    pub stops: Vec<String>,
    pub total_distance: f64,
    /// Fraction of workload capacity consumed by service and travel.
    pub utilisation: f64,
}

/// Outputs of a technician-routing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResults {
    pub assignments: Vec<CustomerAssignmentRow>,
    pub routes: Vec<TechnicianRoute>,
}

/// Read the routing solution into the assignment report and tours.
pub fn extract_routing_results(
    formulation: &RoutingFormulation,
    instance: &RoutingInstance,
    solved: &SolvedModel,
) -> RoutingResults {
    let mut assignments = Vec::with_capacity(instance.customers.len());
    for (c, customer) in instance.customers.iter().enumerate() {
        let job = &instance.jobs[customer.job];
        let location = instance.distances.location_name(customer.location).to_string();

        if solved.value(formulation.gap[c]) > BINARY_THRESHOLD {
            info!("[PostProcessing] Nobody assigned to {} ({}) in {}", customer.name, job.name, location);
            assignments.push(CustomerAssignmentRow {
                customer: customer.name.clone(),
                job: job.name.clone(),
                location,
                technician: None,
                start_time: None,
                lateness: 0.0,
                start_correction: 0.0,
                end_correction: 0.0,
            });
            continue;
        }

        let technician = instance
            .technicians
            .iter()
            .enumerate()
            .find(|(k, _)| solved.value(formulation.assignment[c][*k]) > BINARY_THRESHOLD)
            .map(|(_, tech)| tech.name.clone());
        let start_time = solved.value(formulation.start_time[customer.location]);
        let zero_if_small = |v: f64| if v.abs() < VALUE_TOL { 0.0 } else { v };

        if let Some(name) = &technician {
            info!(
                "[PostProcessing] {} assigned to {} ({}) in {}. Start at t={:.1}.",
                name, customer.name, job.name, location, start_time
            );
        }

        assignments.push(CustomerAssignmentRow {
            customer: customer.name.clone(),
            job: job.name.clone(),
            location,
            technician,
            start_time: Some(start_time),
            lateness: zero_if_small(solved.value(formulation.lateness[c])),
            start_correction: zero_if_small(solved.value(formulation.early_slack[c])),
            end_correction: zero_if_small(solved.value(formulation.late_slack[c])),
        });
    }

    let num_l = instance.distances.len();
    let mut routes = Vec::with_capacity(instance.technicians.len());
    for (k, technician) in instance.technicians.iter().enumerate() {
        let used = solved.value(formulation.active[k]) > BINARY_THRESHOLD;
        let mut stops = Vec::new();
        let mut total_distance = 0.0;

        if used {
            stops.push(instance.distances.location_name(technician.depot).to_string());
            let mut current = technician.depot;
            // A closed tour revisits each location at most once, so the
            // step count is bounded by the location count.
            for _ in 0..=num_l {
                let next = (0..num_l)
                    .find(|&j| solved.value(formulation.arcs[current][j][k]) > BINARY_THRESHOLD);
                match next {
                    Some(j) => {
                        total_distance += instance.distances.get(current, j);
                        stops.push(instance.distances.location_name(j).to_string());
                        current = j;
                        if current == technician.depot {
                            break;
                        }
                    }
                    None => break,
                }
            }
            info!("[PostProcessing] {}'s route: {}", technician.name, stops.join(" -> "));
        } else {
            info!("[PostProcessing] {} is not used", technician.name);
        }

        let service: f64 = instance
            .customers
            .iter()
            .enumerate()
            .filter(|(c, _)| solved.value(formulation.assignment[*c][k]) > BINARY_THRESHOLD)
            .map(|(_, customer)| instance.jobs[customer.job].duration)
            .sum();
        let utilisation = if technician.capacity > 0.0 {
            (service + total_distance) / technician.capacity
        } else {
            0.0
        };

        routes.push(TechnicianRoute {
            technician: technician.name.clone(),
            used,
            stops,
            total_distance,
            utilisation,
        });
    }

    RoutingResults { assignments, routes }
}
