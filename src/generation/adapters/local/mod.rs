//! Filesystem-backed object storage for single-host deployments.

mod object_store;

pub use object_store::{LocalObjectStore, UrlVerificationError};
