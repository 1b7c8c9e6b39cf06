//! Shared world state for job execution BDD scenarios.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::support::ManualClock;
use paperjobs::generation::{
    adapters::memory::{
        GeneratorRelease, InMemoryCredentialProvider, InMemoryJobRepository, InMemoryObjectStore,
        ScriptedGenerator,
    },
    domain::{JobId, OwnerId},
    services::{JobExecutor, JobPorts, JobService, JobServiceError, JobSettings},
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestJobService = JobService<
    InMemoryJobRepository,
    InMemoryObjectStore,
    ScriptedGenerator,
    InMemoryCredentialProvider,
    ManualClock,
>;

/// Scenario world for job execution behaviour tests.
pub struct JobExecutionWorld {
    pub owner: OwnerId,
    pub repository: Arc<InMemoryJobRepository>,
    pub store: Arc<InMemoryObjectStore>,
    pub credentials: Arc<InMemoryCredentialProvider>,
    pub clock: Arc<ManualClock>,
    pub generator: ScriptedGenerator,
    pub release: Option<GeneratorRelease>,
    pub settings: JobSettings,
    pub service: Option<TestJobService>,
    pub submitted: Vec<JobId>,
    pub last_rejection: Option<JobServiceError>,
}

impl JobExecutionWorld {
    /// Creates a world with default settings and no running service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: OwnerId::new(),
            repository: Arc::new(InMemoryJobRepository::new()),
            store: Arc::new(InMemoryObjectStore::new()),
            credentials: Arc::new(InMemoryCredentialProvider::new()),
            clock: Arc::new(ManualClock::default()),
            generator: ScriptedGenerator::new(),
            release: None,
            settings: JobSettings::default(),
            service: None,
            submitted: Vec::new(),
            last_rejection: None,
        }
    }

    /// Sets the execution slot count before the service starts.
    pub fn allow_concurrent(&mut self, slots: usize) -> Result<(), eyre::Report> {
        self.settings.max_concurrent_jobs =
            NonZeroUsize::new(slots).ok_or_else(|| eyre::eyre!("slot count must be positive"))?;
        Ok(())
    }

    /// Returns the job service, starting it on first use.
    pub fn service(&mut self) -> &TestJobService {
        self.service.get_or_insert_with(|| {
            let ports = JobPorts {
                repository: Arc::clone(&self.repository),
                store: Arc::clone(&self.store),
                generator: Arc::new(self.generator.clone()),
                credentials: Arc::clone(&self.credentials),
                clock: Arc::clone(&self.clock),
            };
            JobService::new(ports, self.settings.clone(), JobExecutor::new())
        })
    }

    /// Returns the most recently admitted job.
    pub fn last_job(&self) -> Result<JobId, eyre::Report> {
        self.submitted
            .last()
            .copied()
            .ok_or_else(|| eyre::eyre!("no job has been admitted in this scenario"))
    }
}

impl Default for JobExecutionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> JobExecutionWorld {
    JobExecutionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
