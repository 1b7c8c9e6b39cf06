//! Adapter implementations for asset ports.

pub mod memory;
pub mod postgres;
