//! Job repository tests against `PostgreSQL`.

use chrono::TimeDelta;
use eyre::{bail, ensure, eyre};
use mockable::Clock;
use paperjobs::generation::{
    adapters::postgres::PostgresJobRepository,
    domain::{
        GalleryQuery, IterationRecord, Job, JobArtifacts, JobId, JobStatus, JobUpdate, NewJob,
        OwnerId, StoragePath,
    },
    ports::{JobRepository, JobRepositoryError},
};
use rstest::rstest;
use serde_json::{Map, Value, json};

use super::helpers::{TestDatabase, database};
use crate::support::{ManualClock, sample_request};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn artifacts(owner: OwnerId, job: JobId) -> JobArtifacts {
    JobArtifacts {
        image_path: StoragePath::final_image(owner, job),
        thumbnail_path: StoragePath::thumbnail(owner, job),
        description: "Enrolment funnel across four sites".to_owned(),
        run_metadata: object(json!({ "iterations": 2, "model": "diagram-v1" })),
        iterations: vec![
            IterationRecord::from_metadata(object(json!({ "iteration": 1, "score": 0.6 }))),
            IterationRecord::from_metadata(object(json!({ "iteration": 2, "score": 0.9 }))),
        ],
    }
}

fn create(
    db: &TestDatabase,
    repository: &PostgresJobRepository,
    owner: OwnerId,
    clock: &ManualClock,
) -> eyre::Result<Job> {
    let new_job = NewJob::new(owner, sample_request()?, clock);
    Ok(db.block_on(repository.create(&new_job))?)
}

fn reload(db: &TestDatabase, repository: &PostgresJobRepository, id: JobId) -> eyre::Result<Job> {
    db.block_on(repository.find_by_id(id))?
        .ok_or_else(|| eyre!("job {id} missing"))
}

#[rstest]
fn created_jobs_are_pending_and_read_back(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let owner = OwnerId::new();

    let job = create(&db, &repository, owner, &clock)?;
    let stored = reload(&db, &repository, job.id())?;

    ensure!(stored.status() == JobStatus::Pending);
    ensure!(stored.owner_id() == owner);
    ensure!(stored.request() == &sample_request()?);
    ensure!(stored.created_at() == job.created_at());
    ensure!(stored.started_at().is_none() && stored.artifacts().is_none());
    ensure!(db.block_on(repository.find_by_id(JobId::new()))?.is_none());
    Ok(())
}

#[rstest]
fn completion_writes_artifacts_and_clears_progress(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let owner = OwnerId::new();
    let job = create(&db, &repository, owner, &clock)?;

    clock.advance(TimeDelta::seconds(1));
    db.block_on(repository.update_fields(job.id(), &JobUpdate::started("queued", &clock)))?;
    let progressed = JobUpdate::progress("iteration 1 of 2", &clock);
    let running = db.block_on(repository.update_fields(job.id(), &progressed))?;
    ensure!(running.status() == JobStatus::Running);
    ensure!(running.progress() == Some("iteration 1 of 2"));

    clock.advance(TimeDelta::seconds(30));
    let expected = artifacts(owner, job.id());
    let completed = JobUpdate::completed(expected.clone(), &clock);
    db.block_on(repository.update_fields(job.id(), &completed))?;

    let stored = reload(&db, &repository, job.id())?;
    ensure!(stored.status() == JobStatus::Completed);
    ensure!(stored.progress().is_none());
    ensure!(stored.artifacts() == Some(&expected));
    ensure!(stored.error_message().is_none());
    ensure!(stored.completed_at() == Some(clock.utc()));
    ensure!(stored.started_at().is_some_and(|at| at < clock.utc()));
    Ok(())
}

#[rstest]
fn terminal_jobs_reject_further_transitions(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let job = create(&db, &repository, OwnerId::new(), &clock)?;
    let failed = JobUpdate::failed("generator unavailable", &clock);
    db.block_on(repository.update_fields(job.id(), &failed))?;

    let restart = JobUpdate::started("retrying", &clock);
    let restarted = db.block_on(repository.update_fields(job.id(), &restart));

    let Err(JobRepositoryError::RejectedTransition(_)) = restarted else {
        bail!("a failed job must refuse to start: {restarted:?}");
    };
    let stored = reload(&db, &repository, job.id())?;
    ensure!(stored.status() == JobStatus::Failed);
    ensure!(stored.error_message() == Some("generator unavailable"));
    ensure!(stored.progress().is_none());
    Ok(())
}

#[rstest]
fn updating_a_missing_job_reports_not_found(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let missing = JobId::new();

    let result = db.block_on(repository.update_fields(missing, &JobUpdate::started("x", &clock)));

    ensure!(matches!(result, Err(JobRepositoryError::NotFound(id)) if id == missing));
    Ok(())
}

#[rstest]
fn listing_pages_newest_first_with_status_filter(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let clock = ManualClock::default();
    let owner = OwnerId::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(create(&db, &repository, owner, &clock)?.id());
        clock.advance(TimeDelta::minutes(1));
    }
    create(&db, &repository, OwnerId::new(), &clock)?;
    let Some(&newest) = ids.last() else {
        bail!("jobs must have been created");
    };
    db.block_on(repository.update_fields(newest, &JobUpdate::failed("stopped", &clock)))?;

    let first = db.block_on(repository.list_by_owner(owner, &GalleryQuery::new(1, 2)?))?;
    let second = db.block_on(repository.list_by_owner(owner, &GalleryQuery::new(2, 2)?))?;
    let pending = GalleryQuery::new(1, 10)?.with_status(JobStatus::Pending);
    let filtered = db.block_on(repository.list_by_owner(owner, &pending))?;

    let listed: Vec<JobId> = first.jobs.iter().chain(&second.jobs).map(Job::id).collect();
    let expected: Vec<JobId> = ids.iter().rev().copied().collect();
    ensure!(listed == expected);
    ensure!(first.total == 3 && second.total == 3);
    ensure!(filtered.total == 2);
    ensure!(filtered.jobs.iter().all(|job| job.status() == JobStatus::Pending));

    let since_second = clock.utc() - TimeDelta::minutes(2);
    ensure!(db.block_on(repository.count_by_owner_since(owner, since_second))? == 2);
    Ok(())
}

#[rstest]
fn deleted_jobs_are_gone(database: eyre::Result<TestDatabase>) -> eyre::Result<()> {
    let db = database?;
    let repository = PostgresJobRepository::new(db.pool.clone());
    let job = create(&db, &repository, OwnerId::new(), &ManualClock::default())?;

    db.block_on(repository.delete(job.id()))?;

    ensure!(db.block_on(repository.find_by_id(job.id()))?.is_none());
    let repeated = db.block_on(repository.delete(job.id()));
    ensure!(matches!(repeated, Err(JobRepositoryError::NotFound(_))));
    Ok(())
}
