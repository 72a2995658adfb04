//! geoapi server library
//!
//! HTTP backends, route table and demo business logic on top of
//! `geoapi-core`.

pub mod backends;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
