//! wlp-solver Library
//!
//! A MIP-based solver for logistics planning problems: selecting warehouses
//! and assigning township demand to them, or assigning and routing
//! technicians under time windows.
//!
//! # Features
//!
//! - Typed entity loading from CSV tables with fail-fast validation
//! - Deterministic MIP formulation builders for two problem profiles
//! - Presolve (fixed-variable removal, trivial-constraint deactivation)
//! - Pluggable solver backends (pure-Rust microlp by default, CBC behind
//!   the `cbc` feature)
//! - Tabular result extraction with run metadata
//!
//! # Example
//!
//! ```no_run
//! use wlp_solver::config::{OptimisationConfig, SolverConfig};
//! use wlp_solver::data::warehouse::{load_townships, load_warehouses, WarehouseInstance};
//! use wlp_solver::data::{read_rows, TownshipRow, WarehouseRow};
//! use wlp_solver::pipeline::optimise_warehouses;
//!
//! let config = OptimisationConfig::default();
//!
//! let warehouse_rows: Vec<WarehouseRow> = read_rows("warehouses.csv").unwrap();
//! let township_rows: Vec<TownshipRow> = read_rows("townships.csv").unwrap();
//! let warehouses = load_warehouses(&warehouse_rows, config.warehouse_storage_height).unwrap();
//! let townships = load_townships(&township_rows, config.total_demand).unwrap();
//! let instance = WarehouseInstance::new(warehouses, townships, config.distance_floor_km);
//!
//! let output = optimise_warehouses(&instance, &config, &SolverConfig::default()).unwrap();
//! for row in &output.results.selection {
//!     println!("{}: {}", row.name, row.selected);
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod formulation;
pub mod model;
pub mod pipeline;
pub mod results;
pub mod solver;

pub use config::{OptimisationConfig, Scenario, SolverConfig};
pub use error::{DataError, FormulationError, InfeasibleModelError, PipelineError, SolverError};
pub use pipeline::{optimise_routes, optimise_warehouses};
