//! Owner-uploaded custom assets such as logos and brand images.
//!
//! Assets share the artifact object store and its signed retrieval URLs
//! with generation jobs, but live in their own bucket and table.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
