//! wlp-solver - Command Line Interface
//!
//! Solve warehouse-location or technician-routing instances from CSV
//! tables and write the result tables back out.

use clap::{Parser, Subcommand, ValueEnum};

use wlp_solver::config::{
    NodeStrategy, OptimisationConfig, Scenario, SolverBackend, SolverConfig,
};
use wlp_solver::data::routing::{
    load_customers, load_jobs, load_technicians, DistanceMatrix, RoutingInstance,
};
use wlp_solver::data::warehouse::{load_townships, load_warehouses, WarehouseInstance};
use wlp_solver::data::{
    read_rows, CustomerRow, DistanceRow, JobRow, TechnicianRow, TownshipRow, WarehouseRow,
};
use wlp_solver::pipeline::{optimise_routes, optimise_warehouses};

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "wlp-solver")]
#[command(version = "1.0")]
#[command(about = "A MIP-based solver for warehouse location and technician routing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the warehouse-location profile
    Solve {
        /// Warehouse options table (name, latitude, longitude, area_sqft, monthly_cost)
        #[arg(short, long)]
        warehouses: PathBuf,

        /// Townships table (township, district, latitude, longitude, proportion_sales)
        #[arg(short, long)]
        townships: PathBuf,

        /// Objective scenario; overrides the parameter file
        #[arg(short, long, value_enum)]
        scenario: Option<ScenarioArg>,

        /// JSON parameter file; absent fields keep their defaults
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Override total system demand
        #[arg(long)]
        total_demand: Option<f64>,

        /// Solver backend
        #[arg(long, value_enum, default_value = "microlp")]
        solver: BackendArg,

        /// Time limit in seconds
        #[arg(long, default_value = "600")]
        time_limit: f64,

        /// Relative MIP gap
        #[arg(long, default_value = "0.01")]
        ratio_gap: f64,

        /// Directory for the output tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Solve the technician-routing profile
    Route {
        /// Technicians table (name, capacity, depot)
        #[arg(long)]
        technicians: PathBuf,

        /// Jobs table (name, priority, duration, covered_by)
        #[arg(long)]
        jobs: PathBuf,

        /// Customers table (name, location, job, window_start, window_end, due_time)
        #[arg(long)]
        customers: PathBuf,

        /// Pairwise distance table (location_a, location_b, distance)
        #[arg(long)]
        distances: PathBuf,

        /// Solver backend
        #[arg(long, value_enum, default_value = "microlp")]
        solver: BackendArg,

        /// Time limit in seconds
        #[arg(long, default_value = "600")]
        time_limit: f64,

        /// Relative MIP gap
        #[arg(long, default_value = "0.01")]
        ratio_gap: f64,

        /// Directory for the output tables
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print instance statistics without solving
    Analyze {
        #[arg(short, long)]
        warehouses: PathBuf,

        #[arg(short, long)]
        townships: PathBuf,

        /// JSON parameter file; absent fields keep their defaults
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ScenarioArg {
    /// Cover all township demand at minimum cost
    CostMinimization,
    /// Maximise profit; demand becomes an upper bound
    ProfitMaximization,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::CostMinimization => Scenario::CostMinimization,
            ScenarioArg::ProfitMaximization => Scenario::ProfitMaximization,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum BackendArg {
    /// Pure-Rust branch-and-bound (always available)
    Microlp,
    /// COIN-OR CBC (requires the `cbc` build feature)
    Cbc,
}

impl From<BackendArg> for SolverBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Microlp => SolverBackend::Microlp,
            BackendArg::Cbc => SolverBackend::Cbc,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            warehouses,
            townships,
            scenario,
            params,
            total_demand,
            solver,
            time_limit,
            ratio_gap,
            output,
        } => {
            let mut config = load_params(params.as_deref())?;
            if let Some(scenario) = scenario {
                config.scenario = scenario.into();
            }
            if let Some(total_demand) = total_demand {
                config.total_demand = total_demand;
            }
            let solver_config = SolverConfig {
                backend: solver.into(),
                ratio_gap,
                time_limit_secs: time_limit,
                node_strategy: NodeStrategy::Hybrid,
            };
            solve_warehouses(&warehouses, &townships, &config, &solver_config, output.as_deref())
        }

        Commands::Route {
            technicians,
            jobs,
            customers,
            distances,
            solver,
            time_limit,
            ratio_gap,
            output,
        } => {
            let solver_config = SolverConfig {
                backend: solver.into(),
                ratio_gap,
                time_limit_secs: time_limit,
                node_strategy: NodeStrategy::Hybrid,
            };
            solve_routes(&technicians, &jobs, &customers, &distances, &solver_config, output.as_deref())
        }

        Commands::Analyze { warehouses, townships, params } => {
            let config = load_params(params.as_deref())?;
            let instance = load_warehouse_instance(&warehouses, &townships, &config)?;
            print!("{}", instance.statistics());
            Ok(())
        }
    }
}

fn load_params(path: Option<&Path>) -> anyhow::Result<OptimisationConfig> {
    match path {
        Some(path) => Ok(OptimisationConfig::from_json_file(path)?),
        None => Ok(OptimisationConfig::default()),
    }
}

fn load_warehouse_instance(
    warehouses: &Path,
    townships: &Path,
    config: &OptimisationConfig,
) -> anyhow::Result<WarehouseInstance> {
    let warehouse_rows: Vec<WarehouseRow> = read_rows(warehouses)?;
    let township_rows: Vec<TownshipRow> = read_rows(townships)?;
    let warehouses = load_warehouses(&warehouse_rows, config.warehouse_storage_height)?;
    let townships = load_townships(&township_rows, config.total_demand)?;
    Ok(WarehouseInstance::new(warehouses, townships, config.distance_floor_km))
}

fn solve_warehouses(
    warehouses: &Path,
    townships: &Path,
    config: &OptimisationConfig,
    solver_config: &SolverConfig,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let instance = load_warehouse_instance(warehouses, townships, config)?;
    println!("Scenario: {}", config.scenario);
    print!("{}", instance.statistics());

    let run = optimise_warehouses(&instance, config, solver_config)?;

    println!(
        "\nSolved in {:.3}s | status: {} | objective: {:.2}",
        run.metadata.duration_secs, run.metadata.solver_status, run.metadata.objective
    );
    for row in &run.results.selection {
        println!("  {} selected: {}", row.name, row.selected);
    }
    let opened = run.results.selection.iter().filter(|r| r.selected).count();
    println!("Opened {} of {} warehouse options.", opened, run.results.selection.len());

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
        write_csv(&dir.join("warehouse_selection.csv"), &run.results.selection)?;
        write_csv(&dir.join("warehouse_township_assignment.csv"), &run.results.assignments)?;
        write_csv(&dir.join("despatcher_requirements.csv"), &run.results.despatchers)?;
        let metadata = serde_json::to_string_pretty(&run.metadata)?;
        fs::write(dir.join("run_metadata.json"), metadata)?;
        println!("Results written to {:?}", dir);
    }
    Ok(())
}

fn solve_routes(
    technicians: &Path,
    jobs: &Path,
    customers: &Path,
    distances: &Path,
    solver_config: &SolverConfig,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let technician_rows: Vec<TechnicianRow> = read_rows(technicians)?;
    let job_rows: Vec<JobRow> = read_rows(jobs)?;
    let customer_rows: Vec<CustomerRow> = read_rows(customers)?;
    let distance_rows: Vec<DistanceRow> = read_rows(distances)?;

    let distances = DistanceMatrix::from_pairs(&distance_rows)?;
    let technicians = load_technicians(&technician_rows, &distances)?;
    let jobs = load_jobs(&job_rows, &technicians)?;
    let customers = load_customers(&customer_rows, &jobs, &distances)?;
    let instance = RoutingInstance { technicians, jobs, customers, distances };

    let run = optimise_routes(&instance, solver_config)?;

    println!(
        "Solved in {:.3}s | status: {} | objective: {:.2}",
        run.metadata.duration_secs, run.metadata.solver_status, run.metadata.objective
    );
    for assignment in &run.results.assignments {
        match &assignment.technician {
            Some(technician) => println!(
                "  {} ({}) -> {} at t={:.1}",
                assignment.customer,
                assignment.job,
                technician,
                assignment.start_time.unwrap_or(0.0)
            ),
            None => println!("  {} ({}) -> unassigned", assignment.customer, assignment.job),
        }
    }
    for route in &run.results.routes {
        if route.used {
            println!(
                "  {}: {} (distance {:.1}, utilisation {:.0}%)",
                route.technician,
                route.stops.join(" -> "),
                route.total_distance,
                route.utilisation * 100.0
            );
        } else {
            println!("  {}: not used", route.technician);
        }
    }

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
        write_csv(&dir.join("customer_assignments.csv"), &run.results.assignments)?;
        let dump = serde_json::to_string_pretty(&run)?;
        fs::write(dir.join("routing_output.json"), dump)?;
        println!("Results written to {:?}", dir);
    }
    Ok(())
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
