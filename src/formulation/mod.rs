//! Formulation builders.
//!
//! Two problem profiles share the same model representation: the
//! warehouse-location profile (open sites, assign township volume, size
//! despatcher crews) and the technician-routing profile (assign and route
//! technicians under time windows). Each builder deterministically maps an
//! entity snapshot plus a configuration value to a [`Model`](crate::model::Model).

pub mod constants;
pub mod routing;
pub mod warehouse;

pub use routing::{build_routing_model, RoutingFormulation};
pub use warehouse::{build_warehouse_model, WarehouseFormulation};
