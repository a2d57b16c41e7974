//! End-to-end technician-routing runs with the default backend.

use wlp_solver::config::SolverConfig;
use wlp_solver::data::routing::{
    load_customers, load_jobs, load_technicians, DistanceMatrix, RoutingInstance,
};
use wlp_solver::data::{CustomerRow, DistanceRow, JobRow, TechnicianRow};
use wlp_solver::pipeline::optimise_routes;

fn pair(a: &str, b: &str, d: f64) -> DistanceRow {
    DistanceRow {
        location_a: a.to_string(),
        location_b: b.to_string(),
        distance: d,
    }
}

fn customer(name: &str, location: &str, job: &str) -> CustomerRow {
    CustomerRow {
        name: name.to_string(),
        location: location.to_string(),
        job: job.to_string(),
        window_start: 0.0,
        window_end: 1000.0,
        due_time: 1000.0,
    }
}

/// One technician, two reachable customers, generous windows.
fn small_instance(covered_by: &str) -> RoutingInstance {
    let distances = DistanceMatrix::from_pairs(&[
        pair("depot", "site_1", 5.0),
        pair("depot", "site_2", 8.0),
        pair("site_1", "site_2", 6.0),
    ])
    .unwrap();
    let technicians = load_technicians(
        &[TechnicianRow {
            name: "Aishah".to_string(),
            capacity: 480.0,
            depot: "depot".to_string(),
        }],
        &distances,
    )
    .unwrap();
    let jobs = load_jobs(
        &[
            JobRow {
                name: "Commissioning".to_string(),
                priority: 2.0,
                duration: 60.0,
                covered_by: covered_by.to_string(),
            },
            JobRow {
                name: "Inspection".to_string(),
                priority: 1.0,
                duration: 30.0,
                covered_by: "Aishah".to_string(),
            },
        ],
        &technicians,
    )
    .unwrap();
    let customers = load_customers(
        &[
            customer("C1", "site_1", "Commissioning"),
            customer("C2", "site_2", "Inspection"),
        ],
        &jobs,
        &distances,
    )
    .unwrap();
    RoutingInstance { technicians, jobs, customers, distances }
}

#[test]
fn both_customers_are_served_on_one_tour() {
    let instance = small_instance("Aishah");
    let run = optimise_routes(&instance, &SolverConfig::default()).unwrap();

    // Serving both customers avoids all penalties, so the optimum carries
    // no gaps, no lateness and no window corrections.
    assert!(run.metadata.objective.abs() < 1e-6);
    for assignment in &run.results.assignments {
        assert_eq!(assignment.technician.as_deref(), Some("Aishah"));
        assert!(assignment.lateness.abs() < 1e-6);
        assert!(assignment.start_correction.abs() < 1e-6);
        assert!(assignment.end_correction.abs() < 1e-6);
    }

    let route = &run.results.routes[0];
    assert!(route.used);
    assert_eq!(route.stops.first().map(String::as_str), Some("depot"));
    assert_eq!(route.stops.last().map(String::as_str), Some("depot"));
    // depot -> two sites -> depot
    assert_eq!(route.stops.len(), 4);
    assert!(route.total_distance > 0.0);
    assert!(route.utilisation > 0.0 && route.utilisation <= 1.0);
}

#[test]
fn uncoverable_job_resolves_to_a_gap_not_a_failure() {
    // Nobody covers Commissioning; C1 must surface as a gap while C2 is
    // still served.
    let instance = small_instance("");
    let run = optimise_routes(&instance, &SolverConfig::default()).unwrap();

    let c1 = run.results.assignments.iter().find(|a| a.customer == "C1").unwrap();
    let c2 = run.results.assignments.iter().find(|a| a.customer == "C2").unwrap();

    assert!(c1.technician.is_none());
    assert_eq!(c2.technician.as_deref(), Some("Aishah"));

    // Exactly the unfilled-job penalty for C1 (priority 2).
    assert!((run.metadata.objective - 2.0 * 6100.0).abs() < 1e-3);
}
