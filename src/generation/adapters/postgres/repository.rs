//! `PostgreSQL` repository implementation for generation job storage.

use super::{
    models::{JobChangeset, JobRow, NewJobRow},
    schema::generation_jobs,
};
use crate::generation::{
    domain::{
        GalleryQuery, GenerationRequest, IterationRecord, Job, JobArtifacts, JobDomainError,
        JobId, JobStatus, JobUpdate, JobUpdateKind, NewJob, OwnerId, PersistedJobData,
        StoragePath,
    },
    ports::{JobPage, JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use serde_json::Value;

/// `PostgreSQL` connection pool type used by job adapters.
pub type JobPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed job repository.
///
/// Transitions are applied as a single conditional `UPDATE` guarded by the
/// allowed source statuses, so concurrent writers cannot skip the state
/// machine.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: JobPgPool,
}

impl PostgresJobRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobRepositoryError::persistence)?
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn create(&self, new_job: &NewJob) -> JobRepositoryResult<Job> {
        let job = Job::from_new(JobId::new(), new_job.clone());
        let row = to_new_row(&job)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(generation_jobs::table)
                .values(&row)
                .execute(connection)
                .map_err(JobRepositoryError::persistence)?;
            Ok(job)
        })
        .await
    }

    async fn update_fields(&self, id: JobId, update: &JobUpdate) -> JobRepositoryResult<Job> {
        let changeset = to_changeset(update)?;
        let sources: Vec<&'static str> = update
            .allowed_sources()
            .iter()
            .map(|status| status.as_str())
            .collect();
        let target = update.target_status();

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                generation_jobs::table
                    .filter(generation_jobs::id.eq(id.into_inner()))
                    .filter(generation_jobs::status.eq_any(sources)),
            )
            .set(&changeset)
            .returning(JobRow::as_returning())
            .get_result::<JobRow>(connection)
            .optional()
            .map_err(JobRepositoryError::persistence)?;

            if let Some(row) = updated {
                return row_to_job(row);
            }

            let current = find_row(connection, id)?.ok_or(JobRepositoryError::NotFound(id))?;
            let from = JobStatus::try_from(current.status.as_str())
                .map_err(JobRepositoryError::persistence)?;
            Err(JobRepositoryError::RejectedTransition(
                JobDomainError::InvalidStateTransition {
                    job_id: id,
                    from,
                    to: target,
                },
            ))
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| find_row(connection, id)?.map(row_to_job).transpose())
            .await
    }

    async fn count_by_owner_since(
        &self,
        owner_id: OwnerId,
        since: DateTime<Utc>,
    ) -> JobRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let count = generation_jobs::table
                .filter(generation_jobs::owner_id.eq(owner_id.into_inner()))
                .filter(generation_jobs::created_at.ge(since))
                .count()
                .get_result::<i64>(connection)
                .map_err(JobRepositoryError::persistence)?;
            u64::try_from(count).map_err(JobRepositoryError::persistence)
        })
        .await
    }

    async fn list_by_owner(
        &self,
        owner_id: OwnerId,
        query: &GalleryQuery,
    ) -> JobRepositoryResult<JobPage> {
        let status_filter = query.status().map(JobStatus::as_str);
        let offset = i64::try_from(query.offset()).map_err(JobRepositoryError::persistence)?;
        let limit = i64::from(query.per_page());

        self.run_blocking(move |connection| {
            let mut count_query = generation_jobs::table
                .filter(generation_jobs::owner_id.eq(owner_id.into_inner()))
                .into_boxed();
            let mut page_query = generation_jobs::table
                .filter(generation_jobs::owner_id.eq(owner_id.into_inner()))
                .into_boxed();
            if let Some(status) = status_filter {
                count_query = count_query.filter(generation_jobs::status.eq(status));
                page_query = page_query.filter(generation_jobs::status.eq(status));
            }

            let total = count_query
                .count()
                .get_result::<i64>(connection)
                .map_err(JobRepositoryError::persistence)?;
            let rows = page_query
                .order(generation_jobs::created_at.desc())
                .offset(offset)
                .limit(limit)
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;

            let jobs = rows
                .into_iter()
                .map(row_to_job)
                .collect::<JobRepositoryResult<Vec<_>>>()?;
            Ok(JobPage {
                jobs,
                total: u64::try_from(total).map_err(JobRepositoryError::persistence)?,
            })
        })
        .await
    }

    async fn delete(&self, id: JobId) -> JobRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                generation_jobs::table.filter(generation_jobs::id.eq(id.into_inner())),
            )
            .execute(connection)
            .map_err(JobRepositoryError::persistence)?;
            if removed == 0 {
                return Err(JobRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn find_row(connection: &mut PgConnection, id: JobId) -> JobRepositoryResult<Option<JobRow>> {
    generation_jobs::table
        .filter(generation_jobs::id.eq(id.into_inner()))
        .select(JobRow::as_select())
        .first::<JobRow>(connection)
        .optional()
        .map_err(JobRepositoryError::persistence)
}

fn to_new_row(job: &Job) -> JobRepositoryResult<NewJobRow> {
    let request = serde_json::to_value(job.request()).map_err(JobRepositoryError::persistence)?;
    Ok(NewJobRow {
        id: job.id().into_inner(),
        owner_id: job.owner_id().into_inner(),
        status: job.status().as_str().to_owned(),
        request,
        created_at: job.created_at(),
        updated_at: job.updated_at(),
    })
}

fn to_changeset(update: &JobUpdate) -> JobRepositoryResult<JobChangeset> {
    let base = JobChangeset {
        status: update.target_status().as_str().to_owned(),
        updated_at: update.at(),
        ..JobChangeset::default()
    };

    let changeset = match update.kind() {
        JobUpdateKind::Started { progress } => JobChangeset {
            progress: Some(Some(progress.clone())),
            started_at: Some(update.at()),
            ..base
        },
        JobUpdateKind::Progress { message } => JobChangeset {
            progress: Some(Some(message.clone())),
            ..base
        },
        JobUpdateKind::Completed(artifacts) => {
            let run_metadata = Value::Object(artifacts.run_metadata.clone());
            let iterations = serde_json::to_value(&artifacts.iterations)
                .map_err(JobRepositoryError::persistence)?;
            JobChangeset {
                progress: Some(None),
                image_path: Some(Some(artifacts.image_path.to_string())),
                thumbnail_path: Some(Some(artifacts.thumbnail_path.to_string())),
                description: Some(Some(artifacts.description.clone())),
                run_metadata: Some(Some(run_metadata)),
                iterations: Some(Some(iterations)),
                error_message: Some(None),
                completed_at: Some(update.at()),
                ..base
            }
        }
        JobUpdateKind::Failed { error_message } => JobChangeset {
            progress: Some(None),
            image_path: Some(None),
            thumbnail_path: Some(None),
            description: Some(None),
            run_metadata: Some(None),
            iterations: Some(None),
            error_message: Some(Some(error_message.clone())),
            completed_at: Some(update.at()),
            ..base
        },
    };
    Ok(changeset)
}

fn row_to_job(row: JobRow) -> JobRepositoryResult<Job> {
    let JobRow {
        id,
        owner_id,
        status: persisted_status,
        progress,
        request: persisted_request,
        image_path,
        thumbnail_path,
        description,
        run_metadata,
        iterations,
        error_message,
        created_at,
        started_at,
        completed_at,
        updated_at,
    } = row;

    let status =
        JobStatus::try_from(persisted_status.as_str()).map_err(JobRepositoryError::persistence)?;
    let request = serde_json::from_value::<GenerationRequest>(persisted_request)
        .map_err(JobRepositoryError::persistence)?;
    let artifacts = match (image_path, thumbnail_path) {
        (Some(image), Some(thumbnail)) => Some(JobArtifacts {
            image_path: StoragePath::new(image).map_err(JobRepositoryError::persistence)?,
            thumbnail_path: StoragePath::new(thumbnail)
                .map_err(JobRepositoryError::persistence)?,
            description: description.unwrap_or_default(),
            run_metadata: run_metadata
                .map(serde_json::from_value)
                .transpose()
                .map_err(JobRepositoryError::persistence)?
                .unwrap_or_default(),
            iterations: iterations
                .map(serde_json::from_value::<Vec<IterationRecord>>)
                .transpose()
                .map_err(JobRepositoryError::persistence)?
                .unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(Job::from_persisted(PersistedJobData {
        id: JobId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        status,
        progress,
        request,
        artifacts,
        error_message,
        created_at,
        started_at,
        completed_at,
        updated_at,
    }))
}
