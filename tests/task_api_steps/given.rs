//! Given steps for task API BDD scenarios.

use super::world::TaskApiWorld;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskboard::api::RawRequest;

#[given("an empty task store")]
fn empty_task_store(world: &mut TaskApiWorld) {
    let _ = world;
}

#[given(r#"a task described as "{description}" exists"#)]
fn task_exists(world: &mut TaskApiWorld, description: String) -> Result<(), eyre::Report> {
    let body = serde_json::to_vec(&serde_json::json!({ "description": description }))
        .wrap_err("encode seed task")?;
    let status = world
        .send(RawRequest::new("POST", "/tasks").with_body(body))
        .status;
    if status != 201 {
        return Err(eyre::eyre!("seeding a task answered {status}"));
    }
    Ok(())
}

#[given("the database is unreachable")]
fn database_unreachable(world: &mut TaskApiWorld) {
    world.store.fail_next_acquisitions(usize::MAX);
}
