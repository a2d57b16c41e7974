//! Input tables and the typed entity model.
//!
//! All tabular input is consumed as CSV rows of named columns; a missing
//! required column fails with a [`DataError`](crate::error::DataError)
//! before any model construction begins.

pub mod routing;
pub mod warehouse;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DataError;

/// Row of the warehouse options table.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseRow {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Floor area in square feet; optional so an absent cell can be reported
    /// with its row number instead of a bare parse failure.
    pub area_sqft: Option<f64>,
    pub monthly_cost: Option<f64>,
}

/// Row of the districts/townships table.
#[derive(Debug, Clone, Deserialize)]
pub struct TownshipRow {
    pub township: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
    pub proportion_sales: Option<f64>,
}

/// Row of the technicians table.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnicianRow {
    pub name: String,
    pub capacity: f64,
    pub depot: String,
}

/// Row of the jobs table. `covered_by` lists eligible technician names
/// separated by `;`; an empty list is allowed and makes customers of this
/// job structurally unassignable.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRow {
    pub name: String,
    pub priority: f64,
    pub duration: f64,
    #[serde(default)]
    pub covered_by: String,
}

/// Row of the customers table.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRow {
    pub name: String,
    pub location: String,
    pub job: String,
    pub window_start: f64,
    pub window_end: f64,
    pub due_time: f64,
}

/// Row of the pairwise distance table.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceRow {
    pub location_a: String,
    pub location_b: String,
    pub distance: f64,
}

/// Read a whole CSV table into typed rows.
pub fn read_rows<T, P>(path: P) -> Result<Vec<T>, DataError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warehouse_rows_parse_from_csv() {
        let data = "name,latitude,longitude,area_sqft,monthly_cost\n\
                    Shah Alam,3.07,101.52,1200.0,8000.0\n\
                    Klang,3.04,101.45,,5000.0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<WarehouseRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].area_sqft, Some(1200.0));
        assert_eq!(rows[1].area_sqft, None);
    }

    #[test]
    fn missing_column_fails_before_model_construction() {
        let data = "name,latitude\nShah Alam,3.07\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let parsed: Result<Vec<WarehouseRow>, _> = reader.deserialize().collect();
        assert!(parsed.is_err());
    }

    #[test]
    fn covered_by_defaults_to_empty() {
        let data = "name,priority,duration\nCommissioning,1.0,60.0\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<JobRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].covered_by, "");
    }
}
