//! Port for the external diagram generation pipeline.

use crate::generation::domain::GenerationRequest;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use secrecy::SecretString;
use serde_json::{Map, Value};
use thiserror::Error;

/// Metadata the generator reports for one refinement iteration.
pub type GeneratedIteration = Map<String, Value>;

/// Result of a successful generator run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    /// Final image written inside the job workspace.
    pub final_image: Utf8PathBuf,
    /// Human-readable description of the diagram.
    pub description: String,
    /// Free-form run metadata.
    pub metadata: Map<String, Value>,
    /// Ordered iteration metadata, possibly with local file references.
    pub iterations: Vec<GeneratedIteration>,
}

/// Opaque, possibly long-running diagram generation pipeline.
///
/// Implementations write their outputs under `workspace` and may take
/// minutes to return.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagramGenerator: Send + Sync {
    /// Runs the pipeline for `request` using the owner's `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] when the pipeline fails; the message is
    /// shown to the job owner.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &SecretString,
        workspace: &Utf8Path,
    ) -> Result<GenerationOutput, GeneratorError>;
}

/// Failure reported by a generator run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GeneratorError {
    message: String,
}

impl GeneratorError {
    /// Creates a generator error with a user-visible message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the user-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
