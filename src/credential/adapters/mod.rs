//! Adapter implementations for credential ports.

pub mod cipher;
pub mod memory;
pub mod postgres;
