//! Entities for the warehouse-location profile.
//!
//! Raw rows become validated records with derived attributes computed
//! exactly once: warehouse capacity from floor area, township demand from
//! re-normalised sales proportions, and the great-circle distance table.

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::{TownshipRow, WarehouseRow};
use crate::error::DataError;

/// Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A candidate warehouse site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_sqft: f64,
    /// Storage volume, `area_sqft * storage_height`. Derived once.
    pub capacity: f64,
    pub monthly_cost: f64,
}

/// A township with its share of total demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Township {
    pub name: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
    /// `proportion_of_sales * total_demand`, after de-duplication and
    /// re-normalisation. Derived once.
    pub demand: f64,
}

/// Build warehouses from raw rows, deriving capacity from floor area.
pub fn load_warehouses(
    rows: &[WarehouseRow],
    storage_height: f64,
) -> Result<Vec<Warehouse>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyTable("warehouses"));
    }

    let mut warehouses = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let area = row.area_sqft.ok_or(DataError::MissingValue {
            table: "warehouses",
            column: "area_sqft",
            row: i,
        })?;
        if area < 0.0 {
            return Err(DataError::NegativeValue {
                table: "warehouses",
                column: "area_sqft",
                row: i,
                value: area,
            });
        }
        let cost = row.monthly_cost.ok_or(DataError::MissingValue {
            table: "warehouses",
            column: "monthly_cost",
            row: i,
        })?;
        if cost < 0.0 {
            return Err(DataError::NegativeValue {
                table: "warehouses",
                column: "monthly_cost",
                row: i,
                value: cost,
            });
        }

        warehouses.push(Warehouse {
            name: row.name.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            area_sqft: area,
            capacity: area * storage_height,
            monthly_cost: cost,
        });
    }
    debug!("[DataProcessing] Processed {} warehouse options.", warehouses.len());
    Ok(warehouses)
}

/// Build townships from raw rows.
///
/// Duplicate township names are dropped, first occurrence wins; this is the
/// documented de-duplication policy, not an incidental side effect. The
/// surviving proportions are re-normalised to sum to 1 before being scaled
/// by `total_demand`, so dropping rows never loses demand.
pub fn load_townships(rows: &[TownshipRow], total_demand: f64) -> Result<Vec<Township>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyTable("townships"));
    }

    let mut seen = HashSet::new();
    let mut kept: Vec<(&TownshipRow, f64)> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if !seen.insert(row.township.clone()) {
            continue;
        }
        let proportion = row.proportion_sales.ok_or(DataError::MissingValue {
            table: "townships",
            column: "proportion_sales",
            row: i,
        })?;
        if proportion < 0.0 {
            return Err(DataError::NegativeValue {
                table: "townships",
                column: "proportion_sales",
                row: i,
                value: proportion,
            });
        }
        kept.push((row, proportion));
    }

    let dropped = rows.len() - kept.len();
    if dropped > 0 {
        warn!("[DataProcessing] Dropped {} duplicate township rows (first occurrence wins).", dropped);
    }

    let proportion_sum: f64 = kept.iter().map(|(_, p)| p).sum();
    if proportion_sum <= 0.0 {
        return Err(DataError::ZeroProportionSum);
    }

    let townships = kept
        .into_iter()
        .map(|(row, proportion)| Township {
            name: row.township.clone(),
            district: row.district.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            demand: proportion / proportion_sum * total_demand,
        })
        .collect::<Vec<_>>();

    debug!("[DataProcessing] Processed {} townships.", townships.len());
    Ok(townships)
}

/// Great-circle distance between two coordinates in kilometres.
fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Read-only warehouse-township distance lookup for one optimisation run.
///
/// Every entry is floored at `floor_km` so the distances are safe divisors
/// in per-trip cost and trip-frequency ratios.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    distances: Vec<Vec<f64>>,
    pub floor_km: f64,
}

impl DistanceTable {
    pub fn build(warehouses: &[Warehouse], townships: &[Township], floor_km: f64) -> Self {
        let distances = warehouses
            .iter()
            .map(|w| {
                townships
                    .iter()
                    .map(|t| {
                        great_circle_km(w.latitude, w.longitude, t.latitude, t.longitude)
                            .max(floor_km)
                    })
                    .collect()
            })
            .collect();
        DistanceTable { distances, floor_km }
    }

    /// Floored distance between warehouse `w` and township `t` in km.
    #[inline]
    pub fn get(&self, w: usize, t: usize) -> f64 {
        self.distances[w][t]
    }
}

/// One immutable input snapshot for the warehouse-location profile.
#[derive(Debug, Clone)]
pub struct WarehouseInstance {
    pub warehouses: Vec<Warehouse>,
    pub townships: Vec<Township>,
    pub distances: DistanceTable,
}

impl WarehouseInstance {
    pub fn new(warehouses: Vec<Warehouse>, townships: Vec<Township>, floor_km: f64) -> Self {
        let distances = DistanceTable::build(&warehouses, &townships, floor_km);
        WarehouseInstance { warehouses, townships, distances }
    }

    pub fn statistics(&self) -> InstanceStatistics {
        let total_capacity = self.warehouses.iter().map(|w| w.capacity).sum();
        let total_monthly_cost = self.warehouses.iter().map(|w| w.monthly_cost).sum();
        let total_demand = self.townships.iter().map(|t| t.demand).sum();

        let mut sum = 0.0;
        let mut max: f64 = 0.0;
        let mut count = 0usize;
        for w in 0..self.warehouses.len() {
            for t in 0..self.townships.len() {
                let d = self.distances.get(w, t);
                sum += d;
                max = max.max(d);
                count += 1;
            }
        }
        let avg_distance = if count > 0 { sum / count as f64 } else { 0.0 };

        InstanceStatistics {
            num_warehouses: self.warehouses.len(),
            num_townships: self.townships.len(),
            total_capacity,
            total_demand,
            total_monthly_cost,
            avg_distance,
            max_distance: max,
        }
    }
}

/// Summary figures for an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub num_warehouses: usize,
    pub num_townships: usize,
    pub total_capacity: f64,
    pub total_demand: f64,
    pub total_monthly_cost: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instance")?;
        writeln!(f, "  Warehouse options: {}", self.num_warehouses)?;
        writeln!(f, "  Townships: {}", self.num_townships)?;
        writeln!(f, "  Total capacity: {:.1}", self.total_capacity)?;
        writeln!(f, "  Total demand: {:.1}", self.total_demand)?;
        writeln!(f, "  Total monthly cost: {:.1}", self.total_monthly_cost)?;
        writeln!(f, "  Avg distance: {:.2} km", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2} km", self.max_distance)
    }
}
