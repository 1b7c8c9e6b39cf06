//! Adapter implementations for generation job ports.

pub mod local;
pub mod memory;
pub mod postgres;
