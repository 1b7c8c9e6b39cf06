//! Immutable generation request parameters.

use super::{JobDomainError, ParseDiagramKindError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of diagram the generator is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramKind {
    /// Methodology or architecture overview diagram.
    #[default]
    Methodology,
    /// Statistical plot rendered from raw data.
    StatisticalPlot,
}

impl DiagramKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Methodology => "methodology",
            Self::StatisticalPlot => "statistical_plot",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DiagramKind {
    type Error = ParseDiagramKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "methodology" => Ok(Self::Methodology),
            "statistical_plot" => Ok(Self::StatisticalPlot),
            _ => Err(ParseDiagramKindError(value.to_owned())),
        }
    }
}

/// Number of critique-and-refine rounds the generator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RefinementIterations(u8);

impl RefinementIterations {
    /// Smallest accepted iteration count.
    pub const MIN: u8 = 1;
    /// Largest accepted iteration count.
    pub const MAX: u8 = 5;
    const DEFAULT: u8 = 3;

    /// Creates a validated iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidRefinementIterations`] when the value
    /// is outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, JobDomainError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(JobDomainError::InvalidRefinementIterations(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying count.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for RefinementIterations {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u8> for RefinementIterations {
    type Error = JobDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RefinementIterations> for u8 {
    fn from(value: RefinementIterations) -> Self {
        value.0
    }
}

/// Input parameters of a generation job.
///
/// Set once when the job is created and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    source_context: String,
    communicative_intent: String,
    diagram_kind: DiagramKind,
    refinement_iterations: RefinementIterations,
    raw_data: Option<Map<String, Value>>,
}

impl GenerationRequest {
    /// Creates a request with the required text fields and default options.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::EmptySourceContext`] or
    /// [`JobDomainError::EmptyCommunicativeIntent`] when either text is blank.
    pub fn new(
        source_context: impl Into<String>,
        communicative_intent: impl Into<String>,
    ) -> Result<Self, JobDomainError> {
        let source = source_context.into();
        if source.trim().is_empty() {
            return Err(JobDomainError::EmptySourceContext);
        }
        let intent = communicative_intent.into();
        if intent.trim().is_empty() {
            return Err(JobDomainError::EmptyCommunicativeIntent);
        }

        Ok(Self {
            source_context: source,
            communicative_intent: intent,
            diagram_kind: DiagramKind::default(),
            refinement_iterations: RefinementIterations::default(),
            raw_data: None,
        })
    }

    /// Sets the diagram kind.
    #[must_use]
    pub const fn with_diagram_kind(mut self, diagram_kind: DiagramKind) -> Self {
        self.diagram_kind = diagram_kind;
        self
    }

    /// Sets the refinement iteration count.
    #[must_use]
    pub const fn with_refinement_iterations(mut self, iterations: RefinementIterations) -> Self {
        self.refinement_iterations = iterations;
        self
    }

    /// Attaches raw structured data for plot generation.
    #[must_use]
    pub fn with_raw_data(mut self, raw_data: Map<String, Value>) -> Self {
        self.raw_data = Some(raw_data);
        self
    }

    /// Returns the source text the diagram is derived from.
    #[must_use]
    pub fn source_context(&self) -> &str {
        &self.source_context
    }

    /// Returns what the diagram should communicate.
    #[must_use]
    pub fn communicative_intent(&self) -> &str {
        &self.communicative_intent
    }

    /// Returns the requested diagram kind.
    #[must_use]
    pub const fn diagram_kind(&self) -> DiagramKind {
        self.diagram_kind
    }

    /// Returns the refinement iteration count.
    #[must_use]
    pub const fn refinement_iterations(&self) -> RefinementIterations {
        self.refinement_iterations
    }

    /// Returns the raw structured data, if any.
    #[must_use]
    pub const fn raw_data(&self) -> Option<&Map<String, Value>> {
        self.raw_data.as_ref()
    }
}
