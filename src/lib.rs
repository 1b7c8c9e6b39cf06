//! Paperjobs: asynchronous diagram generation job orchestration.
//!
//! This crate admits long-running diagram generation jobs on behalf of many
//! owners, bounds how many execute at once, drives each job through a
//! persisted lifecycle, and publishes the resulting image and thumbnail to
//! object storage where owners can poll for them.
//!
//! # Architecture
//!
//! Paperjobs follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, storage, etc.)
//!
//! # Modules
//!
//! - [`generation`]: Job lifecycle, admission control, and orchestration
//! - [`credential`]: Per-owner generation credentials encrypted at rest
//! - [`asset`]: Owner-uploaded logos and brand images
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Structured logging setup

pub mod asset;
pub mod config;
pub mod credential;
pub mod generation;
pub mod telemetry;
