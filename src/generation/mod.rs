//! Diagram generation job orchestration.
//!
//! This module admits generation requests on behalf of many owners, bounds
//! how many run at once, drives each job through its lifecycle, and serves
//! pollable job status. The module follows hexagonal architecture:
//!
//! - Domain types and the job state machine in [`domain`]
//! - Port contracts for persistence, object storage, credentials, and the
//!   generator in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Admission control, orchestration, and the job service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
