//! Entities for the technician-routing profile.
//!
//! Technicians, jobs and customers reference each other by index into the
//! instance vectors, and every location name resolves into the symmetric
//! distance matrix. All cross-references are validated at load time.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{CustomerRow, DistanceRow, JobRow, TechnicianRow};
use crate::error::DataError;

/// Tolerance when comparing the two declared directions of a pair.
const SYMMETRY_TOL: f64 = 1e-6;

/// A mobile worker with a home depot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub name: String,
    /// Workload capacity in minutes (service plus travel).
    pub capacity: f64,
    /// Index of the home depot in the distance matrix.
    pub depot: usize,
}

/// A job type with the set of technicians able to perform it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub priority: f64,
    /// Service duration in minutes.
    pub duration: f64,
    /// Indices of eligible technicians. May be empty, in which case every
    /// customer of this job is structurally unassignable and resolves to
    /// the gap indicator.
    pub covered_by: Vec<usize>,
}

/// A service request at a location within a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    /// Index of the customer location in the distance matrix.
    pub location: usize,
    /// Index of the requested job.
    pub job: usize,
    pub window_start: f64,
    pub window_end: f64,
    pub due_time: f64,
}

/// Symmetric location-to-location distance matrix with zero diagonal.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    locations: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Build from pairwise rows, enforcing symmetry.
    ///
    /// When both directions of a pair are declared they must agree within
    /// tolerance; a single declared direction is mirrored; a pair with no
    /// declared direction is an error. Diagonal entries must be zero.
    pub fn from_pairs(rows: &[DistanceRow]) -> Result<Self, DataError> {
        if rows.is_empty() {
            return Err(DataError::EmptyTable("distances"));
        }

        let mut names = BTreeSet::new();
        for row in rows {
            names.insert(row.location_a.clone());
            names.insert(row.location_b.clone());
        }
        let locations: Vec<String> = names.into_iter().collect();
        let index: HashMap<String, usize> = locations
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let n = locations.len();
        let mut matrix = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            matrix[i][i] = 0.0;
        }

        for (r, row) in rows.iter().enumerate() {
            if row.distance < 0.0 {
                return Err(DataError::NegativeValue {
                    table: "distances",
                    column: "distance",
                    row: r,
                    value: row.distance,
                });
            }
            let a = index[&row.location_a];
            let b = index[&row.location_b];
            if a == b {
                if row.distance != 0.0 {
                    return Err(DataError::NonZeroDiagonal {
                        location: row.location_a.clone(),
                        value: row.distance,
                    });
                }
                continue;
            }
            let existing = matrix[a][b];
            if existing.is_nan() {
                matrix[a][b] = row.distance;
                matrix[b][a] = row.distance;
            } else if (existing - row.distance).abs() > SYMMETRY_TOL {
                return Err(DataError::AsymmetricDistance {
                    from: row.location_a.clone(),
                    to: row.location_b.clone(),
                    forward: row.distance,
                    backward: existing,
                });
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if matrix[i][j].is_nan() {
                    return Err(DataError::MissingDistance {
                        from: locations[i].clone(),
                        to: locations[j].clone(),
                    });
                }
            }
        }

        debug!("[DataProcessing] Processed distance matrix over {} locations.", n);
        Ok(DistanceMatrix { locations, index, matrix })
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.matrix[a][b]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn location_name(&self, i: usize) -> &str {
        &self.locations[i]
    }

    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Build technicians, resolving each depot against the distance matrix.
pub fn load_technicians(
    rows: &[TechnicianRow],
    distances: &DistanceMatrix,
) -> Result<Vec<Technician>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyTable("technicians"));
    }

    let mut technicians = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.capacity < 0.0 {
            return Err(DataError::NegativeValue {
                table: "technicians",
                column: "capacity",
                row: i,
                value: row.capacity,
            });
        }
        let depot = distances.location_index(&row.depot).ok_or_else(|| {
            DataError::UnknownReference {
                table: "technicians",
                row: i,
                reference: row.depot.clone(),
            }
        })?;
        technicians.push(Technician {
            name: row.name.clone(),
            capacity: row.capacity,
            depot,
        });
    }
    debug!("[DataProcessing] Processed {} technicians.", technicians.len());
    Ok(technicians)
}

/// Build jobs, resolving covered-by names against the technician list.
pub fn load_jobs(rows: &[JobRow], technicians: &[Technician]) -> Result<Vec<Job>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyTable("jobs"));
    }

    let by_name: HashMap<&str, usize> = technicians
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut jobs = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.duration < 0.0 {
            return Err(DataError::NegativeValue {
                table: "jobs",
                column: "duration",
                row: i,
                value: row.duration,
            });
        }
        let mut covered_by = Vec::new();
        for name in row.covered_by.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let tech = by_name.get(name).copied().ok_or_else(|| DataError::UnknownReference {
                table: "jobs",
                row: i,
                reference: name.to_string(),
            })?;
            covered_by.push(tech);
        }
        jobs.push(Job {
            name: row.name.clone(),
            priority: row.priority,
            duration: row.duration,
            covered_by,
        });
    }
    debug!("[DataProcessing] Processed {} jobs.", jobs.len());
    Ok(jobs)
}

/// Build customers, resolving job and location references.
pub fn load_customers(
    rows: &[CustomerRow],
    jobs: &[Job],
    distances: &DistanceMatrix,
) -> Result<Vec<Customer>, DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyTable("customers"));
    }

    let job_by_name: HashMap<&str, usize> =
        jobs.iter().enumerate().map(|(i, j)| (j.name.as_str(), i)).collect();

    let mut customers = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let job = job_by_name.get(row.job.as_str()).copied().ok_or_else(|| {
            DataError::UnknownReference {
                table: "customers",
                row: i,
                reference: row.job.clone(),
            }
        })?;
        let location = distances.location_index(&row.location).ok_or_else(|| {
            DataError::UnknownReference {
                table: "customers",
                row: i,
                reference: row.location.clone(),
            }
        })?;
        customers.push(Customer {
            name: row.name.clone(),
            location,
            job,
            window_start: row.window_start,
            window_end: row.window_end,
            due_time: row.due_time,
        });
    }
    debug!("[DataProcessing] Processed {} customers.", customers.len());
    Ok(customers)
}

/// One immutable input snapshot for the technician-routing profile.
#[derive(Debug, Clone)]
pub struct RoutingInstance {
    pub technicians: Vec<Technician>,
    pub jobs: Vec<Job>,
    pub customers: Vec<Customer>,
    pub distances: DistanceMatrix,
}

impl RoutingInstance {
    /// Distinct depot location indices, in ascending order.
    pub fn depots(&self) -> Vec<usize> {
        let set: BTreeSet<usize> = self.technicians.iter().map(|t| t.depot).collect();
        set.into_iter().collect()
    }

    /// Distinct customer location indices, in ascending order.
    pub fn customer_locations(&self) -> Vec<usize> {
        let set: BTreeSet<usize> = self.customers.iter().map(|c| c.location).collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, d: f64) -> DistanceRow {
        DistanceRow {
            location_a: a.to_string(),
            location_b: b.to_string(),
            distance: d,
        }
    }

    #[test]
    fn single_direction_is_mirrored() {
        let matrix = DistanceMatrix::from_pairs(&[pair("A", "B", 10.0)]).unwrap();
        let a = matrix.location_index("A").unwrap();
        let b = matrix.location_index("B").unwrap();
        assert_eq!(matrix.get(a, b), 10.0);
        assert_eq!(matrix.get(b, a), 10.0);
        assert_eq!(matrix.get(a, a), 0.0);
    }

    #[test]
    fn asymmetric_pair_is_rejected() {
        let rows = vec![pair("A", "B", 10.0), pair("B", "A", 12.0)];
        assert!(matches!(
            DistanceMatrix::from_pairs(&rows),
            Err(DataError::AsymmetricDistance { .. })
        ));
    }

    #[test]
    fn missing_pair_is_rejected() {
        // C is declared as a location but the (A, C) pair never is.
        let rows = vec![pair("A", "B", 10.0), pair("B", "C", 4.0)];
        assert!(matches!(
            DistanceMatrix::from_pairs(&rows),
            Err(DataError::MissingDistance { .. })
        ));
    }

    #[test]
    fn nonzero_diagonal_is_rejected() {
        let rows = vec![pair("A", "A", 1.0), pair("A", "B", 2.0)];
        assert!(matches!(
            DistanceMatrix::from_pairs(&rows),
            Err(DataError::NonZeroDiagonal { .. })
        ));
    }

    #[test]
    fn empty_covered_by_is_allowed() {
        let matrix =
            DistanceMatrix::from_pairs(&[pair("depot", "site", 5.0)]).unwrap();
        let technicians = load_technicians(
            &[TechnicianRow {
                name: "Aishah".to_string(),
                capacity: 480.0,
                depot: "depot".to_string(),
            }],
            &matrix,
        )
        .unwrap();
        let jobs = load_jobs(
            &[JobRow {
                name: "Inspection".to_string(),
                priority: 1.0,
                duration: 30.0,
                covered_by: String::new(),
            }],
            &technicians,
        )
        .unwrap();
        assert!(jobs[0].covered_by.is_empty());
    }

    #[test]
    fn unknown_job_reference_is_rejected() {
        let matrix = DistanceMatrix::from_pairs(&[pair("depot", "site", 5.0)]).unwrap();
        let rows = vec![CustomerRow {
            name: "C1".to_string(),
            location: "site".to_string(),
            job: "NoSuchJob".to_string(),
            window_start: 0.0,
            window_end: 100.0,
            due_time: 120.0,
        }];
        assert!(matches!(
            load_customers(&rows, &[], &matrix),
            Err(DataError::UnknownReference { table: "customers", .. })
        ));
    }
}
