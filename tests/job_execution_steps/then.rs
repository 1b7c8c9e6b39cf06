//! Then steps for job execution BDD scenarios.

use std::time::Duration;

use super::world::{JobExecutionWorld, run_async};
use paperjobs::generation::{
    domain::{JobId, JobStatus, JobView},
    ports::JobRepository,
};
use rstest_bdd_macros::then;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const POLL_LIMIT: usize = 400;

fn view(world: &mut JobExecutionWorld, job_id: JobId) -> Result<JobView, eyre::Report> {
    let owner = world.owner;
    Ok(run_async(world.service().status(job_id, owner))?)
}

fn expect_status(
    world: &mut JobExecutionWorld,
    job_id: JobId,
    expected: JobStatus,
) -> Result<JobView, eyre::Report> {
    let current = view(world, job_id)?;
    if current.status != expected {
        return Err(eyre::eyre!(
            "expected job {job_id} to be {expected}, found {} ({:?})",
            current.status,
            current.error_message
        ));
    }
    Ok(current)
}

#[then("one job is running and one job is pending")]
fn one_running_one_pending(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let mut polls = 0_usize;
    while world.generator.calls() == 0 {
        if polls >= POLL_LIMIT {
            return Err(eyre::eyre!("no job reached the generator"));
        }
        run_async(tokio::time::sleep(POLL_INTERVAL));
        polls = polls.saturating_add(1);
    }

    let jobs = world.submitted.clone();
    let mut statuses = Vec::with_capacity(jobs.len());
    for job_id in jobs {
        statuses.push(view(world, job_id)?.status);
    }
    let running = statuses.iter().filter(|s| **s == JobStatus::Running).count();
    let pending = statuses.iter().filter(|s| **s == JobStatus::Pending).count();
    if (running, pending) != (1, 1) {
        return Err(eyre::eyre!("expected one running and one pending, got {statuses:?}"));
    }
    Ok(())
}

#[then("every submitted job is completed")]
fn every_job_completed(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    run_async(world.service().executor().wait_idle());
    for job_id in world.submitted.clone() {
        let completed = expect_status(world, job_id, JobStatus::Completed)?;
        if completed.image_url.is_none() || completed.thumbnail_url.is_none() {
            return Err(eyre::eyre!("completed job {job_id} is missing retrieval urls"));
        }
    }
    Ok(())
}

#[then("no more than {limit:usize} jobs ran at once")]
fn no_more_than_ran_at_once(
    world: &mut JobExecutionWorld,
    limit: usize,
) -> Result<(), eyre::Report> {
    let peak = world.service().gate().peak();
    if peak > limit {
        return Err(eyre::eyre!("{peak} jobs ran at once, limit was {limit}"));
    }
    Ok(())
}

#[then("the first job is completed")]
fn first_job_completed(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let first = world
        .submitted
        .first()
        .copied()
        .ok_or_else(|| eyre::eyre!("no job has been admitted"))?;
    expect_status(world, first, JobStatus::Completed)?;
    Ok(())
}

#[then("the last job is completed")]
fn last_job_completed(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let last = world.last_job()?;
    expect_status(world, last, JobStatus::Completed)?;
    Ok(())
}

#[then(r#"the last job failed with "{message}""#)]
fn last_job_failed_with(
    world: &mut JobExecutionWorld,
    message: String,
) -> Result<(), eyre::Report> {
    let last = world.last_job()?;
    let failed = expect_status(world, last, JobStatus::Failed)?;
    if failed.error_message.as_deref() != Some(message.as_str()) {
        return Err(eyre::eyre!(
            "expected failure message {message:?}, found {:?}",
            failed.error_message
        ));
    }
    Ok(())
}

#[then("the last job never started")]
fn last_job_never_started(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let last = world.last_job()?;
    let job = run_async(world.repository.find_by_id(last))?
        .ok_or_else(|| eyre::eyre!("job {last} is missing"))?;
    if job.started_at().is_some() {
        return Err(eyre::eyre!("job {last} was started"));
    }
    Ok(())
}

#[then(r#"the submission is rejected as "{code}""#)]
fn submission_rejected_as(world: &JobExecutionWorld, code: String) -> Result<(), eyre::Report> {
    let rejection = world
        .last_rejection
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no submission was rejected"))?;
    if rejection.code() != code {
        return Err(eyre::eyre!("expected rejection {code}, got {rejection}"));
    }
    Ok(())
}

#[then("no execution slot is in use")]
fn no_slot_in_use(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let active = world.service().gate().active();
    if active != 0 {
        return Err(eyre::eyre!("{active} execution slots still held"));
    }
    Ok(())
}

#[then("no job workspace remains")]
fn no_workspace_remains(world: &JobExecutionWorld) -> Result<(), eyre::Report> {
    let leftover: Vec<_> = world
        .generator
        .workspaces()
        .into_iter()
        .filter(|dir| dir.exists())
        .collect();
    if !leftover.is_empty() {
        return Err(eyre::eyre!("job workspaces left behind: {leftover:?}"));
    }
    Ok(())
}
