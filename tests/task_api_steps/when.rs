//! When steps for task API BDD scenarios.

use super::world::TaskApiWorld;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskboard::api::RawRequest;

#[when(r#"a client creates a task described as "{description}""#)]
fn create_task(world: &mut TaskApiWorld, description: String) -> Result<(), eyre::Report> {
    let body = serde_json::to_vec(&serde_json::json!({ "description": description }))
        .wrap_err("encode task body")?;
    world.send(RawRequest::new("POST", "/tasks").with_body(body));
    Ok(())
}

#[when("a client lists the tasks")]
fn list_tasks(world: &mut TaskApiWorld) {
    world.send(RawRequest::new("GET", "/tasks"));
}

#[when("a client posts an empty JSON object")]
fn post_empty_object(world: &mut TaskApiWorld) {
    world.send(RawRequest::new("POST", "/tasks").with_body("{}"));
}

#[when("a client posts a malformed body")]
fn post_malformed_body(world: &mut TaskApiWorld) {
    world.send(RawRequest::new("POST", "/tasks").with_body("{\"description\":"));
}

#[when(r#"a client sends "{method}" to "{path}""#)]
fn send_request(world: &mut TaskApiWorld, method: String, path: String) {
    world.send(RawRequest::new(method, path));
}
