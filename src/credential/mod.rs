//! Per-owner generation credentials, encrypted at rest.
//!
//! Owners store the API key their jobs run with. Keys are encrypted before
//! they reach persistence and decrypted only when a job resolves them. The
//! module follows the same hexagonal layout as job management:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The credential service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
