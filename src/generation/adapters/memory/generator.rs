//! Scripted diagram generator that renders a placeholder image locally.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use image::{ImageFormat, Rgb, RgbImage};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

use crate::generation::{
    domain::GenerationRequest,
    ports::{DiagramGenerator, GeneratedIteration, GenerationOutput, GeneratorError},
};

/// File name of the rendered image inside the workspace.
const FINAL_IMAGE_NAME: &str = "final.png";

/// Releases runs of a held [`ScriptedGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorRelease(Arc<Semaphore>);

impl GeneratorRelease {
    /// Lets `runs` waiting or future generator calls proceed.
    pub fn release(&self, runs: usize) {
        self.0.add_permits(runs);
    }
}

/// Generator standing in for the external pipeline.
///
/// It writes a solid-colour PNG into the workspace and reports one metadata
/// record per refinement iteration. It can be scripted to fail, or to hold
/// each call until released, and it records the workspaces it was given.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    width: u32,
    height: u32,
    failure: Option<String>,
    hold: Option<Arc<Semaphore>>,
    calls: Arc<AtomicUsize>,
    workspaces: Arc<Mutex<Vec<Utf8PathBuf>>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            failure: None,
            hold: None,
            calls: Arc::new(AtomicUsize::new(0)),
            workspaces: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ScriptedGenerator {
    /// Creates a generator rendering 800x600 images.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rendered image size.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Makes every call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Makes every call wait for a release before producing output.
    #[must_use]
    pub fn held(mut self) -> (Self, GeneratorRelease) {
        let hold = Arc::new(Semaphore::new(0));
        self.hold = Some(Arc::clone(&hold));
        (self, GeneratorRelease(hold))
    }

    /// Returns the number of calls started so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the workspaces passed to the generator, in call order.
    #[must_use]
    pub fn workspaces(&self) -> Vec<Utf8PathBuf> {
        self.workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn render(&self, workspace: &Utf8Path) -> Result<Utf8PathBuf, GeneratorError> {
        let canvas = RgbImage::from_pixel(self.width, self.height, Rgb([240, 240, 255]));
        let target = workspace.join(FINAL_IMAGE_NAME);
        canvas
            .save_with_format(&target, ImageFormat::Png)
            .map_err(|err| GeneratorError::new(format!("failed to render diagram: {err}")))?;
        Ok(target)
    }
}

fn iteration_records(request: &GenerationRequest, workspace: &Utf8Path) -> Vec<GeneratedIteration> {
    (1..=request.refinement_iterations().value())
        .map(|round| {
            let mut record = Map::new();
            record.insert("iteration".to_owned(), json!(round));
            record.insert(
                "image_path".to_owned(),
                json!(workspace.join(format!("iteration_{round}.png")).as_str()),
            );
            record.insert("critique".to_owned(), json!("layout accepted"));
            record
        })
        .collect()
}

#[async_trait]
impl DiagramGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _credential: &SecretString,
        workspace: &Utf8Path,
    ) -> Result<GenerationOutput, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.workspaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(workspace.to_owned());

        if let Some(hold) = &self.hold {
            hold.acquire()
                .await
                .map_err(|err| GeneratorError::new(err.to_string()))?
                .forget();
        }
        if let Some(message) = &self.failure {
            return Err(GeneratorError::new(message.clone()));
        }

        let final_image = self.render(workspace)?;
        let mut metadata = Map::new();
        metadata.insert(
            "diagram_type".to_owned(),
            Value::String(request.diagram_kind().as_str().to_owned()),
        );
        metadata.insert(
            "refinement_iterations".to_owned(),
            json!(request.refinement_iterations().value()),
        );
        Ok(GenerationOutput {
            final_image,
            description: format!("Diagram: {}", request.communicative_intent()),
            metadata,
            iterations: iteration_records(request, workspace),
        })
    }
}
