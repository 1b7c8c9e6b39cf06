//! When steps for job execution BDD scenarios.

use super::world::{JobExecutionWorld, run_async};
use crate::support::sample_request;
use chrono::TimeDelta;
use rstest_bdd_macros::when;

fn submit_one(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let owner = world.owner;
    let request = sample_request()?;
    let result = run_async(world.service().submit(owner, request));
    match result {
        Ok(job_id) => world.submitted.push(job_id),
        Err(err) => world.last_rejection = Some(err),
    }
    Ok(())
}

#[when("the owner submits {count:usize} jobs")]
fn owner_submits_jobs(world: &mut JobExecutionWorld, count: usize) -> Result<(), eyre::Report> {
    for _ in 0..count {
        submit_one(world)?;
    }
    Ok(())
}

#[when("the owner submits a job")]
fn owner_submits_a_job(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    submit_one(world)
}

#[when("the owner removes their credential")]
fn owner_removes_credential(world: &mut JobExecutionWorld) {
    world.credentials.revoke(world.owner);
}

#[when("the generator finishes all held runs")]
fn generator_finishes_runs(world: &mut JobExecutionWorld) -> Result<(), eyre::Report> {
    let release = world
        .release
        .as_ref()
        .ok_or_else(|| eyre::eyre!("generator is not holding runs"))?;
    release.release(world.submitted.len());
    run_async(world.service().executor().wait_idle());
    Ok(())
}

#[when("all jobs settle")]
fn all_jobs_settle(world: &mut JobExecutionWorld) {
    run_async(world.service().executor().wait_idle());
}

#[when("{minutes:i64} minutes pass")]
fn minutes_pass(world: &mut JobExecutionWorld, minutes: i64) {
    world.clock.advance(TimeDelta::minutes(minutes));
}

#[when("the object store accepts uploads")]
fn store_accepts_uploads(world: &mut JobExecutionWorld) {
    world.store.fail_uploads(false);
}
