//! Error types for the optimisation pipeline.
//!
//! Four failure families are kept distinct so callers can tell malformed
//! input, a bad configuration, proven infeasibility and a solver crash
//! apart: [`DataError`], [`FormulationError`], [`InfeasibleModelError`]
//! and [`SolverError`]. [`PipelineError`] is the union surfaced by a full
//! optimisation run.

use std::fmt;
use std::io;

/// Malformed, missing or inconsistent input data.
///
/// Always raised before any model construction begins.
#[derive(Debug)]
pub enum DataError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// A required value is absent from a row.
    MissingValue {
        table: &'static str,
        column: &'static str,
        row: usize,
    },
    /// A value that must be non-negative is negative.
    NegativeValue {
        table: &'static str,
        column: &'static str,
        row: usize,
        value: f64,
    },
    /// Township demand proportions sum to zero, so they cannot be
    /// re-normalised.
    ZeroProportionSum,
    /// An input table contains no rows.
    EmptyTable(&'static str),
    /// The pairwise distance table declares both directions of a pair with
    /// different values.
    AsymmetricDistance {
        from: String,
        to: String,
        forward: f64,
        backward: f64,
    },
    /// Neither direction of a location pair is declared.
    MissingDistance { from: String, to: String },
    /// A diagonal entry of the distance table is not zero.
    NonZeroDiagonal { location: String, value: f64 },
    /// A row references an entity that does not exist in its parent table.
    UnknownReference {
        table: &'static str,
        row: usize,
        reference: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "I/O error reading input: {}", e),
            DataError::Csv(e) => write!(f, "CSV error: {}", e),
            DataError::Json(e) => write!(f, "JSON error: {}", e),
            DataError::MissingValue { table, column, row } => {
                write!(f, "{} row {}: missing value for '{}'", table, row, column)
            }
            DataError::NegativeValue { table, column, row, value } => {
                write!(f, "{} row {}: '{}' must be non-negative, got {}", table, row, column, value)
            }
            DataError::ZeroProportionSum => {
                write!(f, "township demand proportions sum to zero; cannot re-normalise")
            }
            DataError::EmptyTable(table) => write!(f, "input table '{}' is empty", table),
            DataError::AsymmetricDistance { from, to, forward, backward } => {
                write!(
                    f,
                    "distance table is asymmetric: {} -> {} is {} but {} -> {} is {}",
                    from, to, forward, to, from, backward
                )
            }
            DataError::MissingDistance { from, to } => {
                write!(f, "distance table has no entry for pair ({}, {})", from, to)
            }
            DataError::NonZeroDiagonal { location, value } => {
                write!(f, "distance from {} to itself must be zero, got {}", location, value)
            }
            DataError::UnknownReference { table, row, reference } => {
                write!(f, "{} row {}: unknown reference '{}'", table, row, reference)
            }
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::Csv(e) => Some(e),
            DataError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DataError {
    fn from(err: io::Error) -> Self {
        DataError::Io(err)
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv(err)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Json(err)
    }
}

/// Invalid configuration for the formulation builder.
#[derive(Debug)]
pub enum FormulationError {
    /// Numeric scenario id outside the recognised set.
    UnknownScenario(u32),
    /// A numeric parameter has a value the formulation cannot use.
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl fmt::Display for FormulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulationError::UnknownScenario(id) => {
                write!(f, "unknown optimisation scenario id {} (recognised: 1, 2)", id)
            }
            FormulationError::InvalidParameter { name, value, reason } => {
                write!(f, "invalid parameter {} = {}: {}", name, value, reason)
            }
        }
    }
}

impl std::error::Error for FormulationError {}

/// The solver proved that no feasible solution exists.
///
/// This is a valid outcome of a well-posed run, not a bug; it is kept
/// separate from [`SolverError`] so reports can distinguish the two.
#[derive(Debug)]
pub struct InfeasibleModelError {
    /// Name of the model that was proven infeasible.
    pub model: String,
}

impl fmt::Display for InfeasibleModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model '{}' was proven infeasible; no solution exists", self.model)
    }
}

impl std::error::Error for InfeasibleModelError {}

/// The solver crashed, ran out of time, or returned a status the adapter
/// does not recognise.
#[derive(Debug)]
pub enum SolverError {
    /// The relaxation is unbounded, which indicates a broken formulation.
    Unbounded,
    /// The wall-clock limit elapsed before optimality was proven.
    TimeLimit {
        /// Whether the backend reported an incumbent when it stopped.
        best_found: bool,
    },
    /// The requested backend was not compiled into this build.
    BackendUnavailable(&'static str),
    /// The backend failed with its own error message.
    Backend(String),
    /// The backend terminated with a status the adapter does not map.
    UnrecognisedStatus(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Unbounded => write!(f, "model is unbounded; check objective and constraints"),
            SolverError::TimeLimit { best_found: true } => {
                write!(f, "time limit reached before optimality; best-found solution discarded")
            }
            SolverError::TimeLimit { best_found: false } => {
                write!(f, "time limit reached with no feasible solution found")
            }
            SolverError::BackendUnavailable(name) => {
                write!(f, "solver backend '{}' is not enabled in this build", name)
            }
            SolverError::Backend(msg) => write!(f, "solver backend failed: {}", msg),
            SolverError::UnrecognisedStatus(status) => {
                write!(f, "solver returned unrecognised termination status: {}", status)
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Union of all failures a full optimisation run can surface.
#[derive(Debug)]
pub enum PipelineError {
    Data(DataError),
    Formulation(FormulationError),
    Infeasible(InfeasibleModelError),
    Solver(SolverError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Data(e) => write!(f, "data error: {}", e),
            PipelineError::Formulation(e) => write!(f, "formulation error: {}", e),
            PipelineError::Infeasible(e) => write!(f, "{}", e),
            PipelineError::Solver(e) => write!(f, "solver error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Data(e) => Some(e),
            PipelineError::Formulation(e) => Some(e),
            PipelineError::Infeasible(e) => Some(e),
            PipelineError::Solver(e) => Some(e),
        }
    }
}

impl From<DataError> for PipelineError {
    fn from(err: DataError) -> Self {
        PipelineError::Data(err)
    }
}

impl From<FormulationError> for PipelineError {
    fn from(err: FormulationError) -> Self {
        PipelineError::Formulation(err)
    }
}

impl From<InfeasibleModelError> for PipelineError {
    fn from(err: InfeasibleModelError) -> Self {
        PipelineError::Infeasible(err)
    }
}

impl From<SolverError> for PipelineError {
    fn from(err: SolverError) -> Self {
        PipelineError::Solver(err)
    }
}
