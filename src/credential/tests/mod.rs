//! Unit tests for credential storage.
