//! Unit tests for generation job management.

pub(crate) mod support;
