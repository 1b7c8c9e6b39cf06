//! Given steps for job execution BDD scenarios.

use super::world::{JobExecutionWorld, run_async};
use crate::support::sample_request;
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a job service allowing {slots:usize} concurrent jobs")]
fn job_service_allowing(world: &mut JobExecutionWorld, slots: usize) -> Result<(), eyre::Report> {
    world.allow_concurrent(slots)
}

#[given("the generator holds every run")]
fn generator_holds_runs(world: &mut JobExecutionWorld) {
    let (generator, release) = world.generator.clone().held();
    world.generator = generator;
    world.release = Some(release);
}

#[given("the owner has a stored credential")]
fn owner_has_credential(world: &mut JobExecutionWorld) {
    world.credentials.grant(world.owner, "sk-scenario-0001");
}

#[given("the object store rejects uploads")]
fn store_rejects_uploads(world: &mut JobExecutionWorld) {
    world.store.fail_uploads(true);
}

#[given("the owner has submitted {count:usize} jobs this hour")]
fn owner_submitted_this_hour(
    world: &mut JobExecutionWorld,
    count: usize,
) -> Result<(), eyre::Report> {
    for _ in 0..count {
        let owner = world.owner;
        let request = sample_request()?;
        let service = world.service();
        let job_id = run_async(async {
            let admitted = service.submit(owner, request).await;
            service.executor().wait_idle().await;
            admitted
        })
        .wrap_err("submit job during scenario setup")?;
        world.submitted.push(job_id);
        world.clock.advance(TimeDelta::minutes(1));
    }
    Ok(())
}
