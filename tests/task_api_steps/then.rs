//! Then steps for task API BDD scenarios.

use super::world::TaskApiWorld;
use rstest_bdd_macros::then;

#[then("the response status is {status:u16}")]
fn response_status(world: &TaskApiWorld, status: u16) -> Result<(), eyre::Report> {
    let response = world
        .last_response
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing response"))?;
    if response.status != status {
        return Err(eyre::eyre!(
            "expected status {status}, got {} with body {}",
            response.status,
            response.body
        ));
    }
    Ok(())
}

#[then(r#"the response describes the task as "{description}""#)]
fn response_describes(world: &TaskApiWorld, description: String) -> Result<(), eyre::Report> {
    let body = world.last_body()?;
    if body["description"] != description.as_str() {
        return Err(eyre::eyre!("unexpected task body {body}"));
    }
    if !body["id"].is_i64() {
        return Err(eyre::eyre!("task body has no numeric id: {body}"));
    }
    Ok(())
}

#[then("the listing contains {count:usize} tasks")]
fn listing_count(world: &TaskApiWorld, count: usize) -> Result<(), eyre::Report> {
    let body = world.last_body()?;
    let tasks = body
        .as_array()
        .ok_or_else(|| eyre::eyre!("listing is not an array: {body}"))?;
    if tasks.len() != count {
        return Err(eyre::eyre!("expected {count} tasks, got {}", tasks.len()));
    }
    Ok(())
}

#[then(r#"the listed descriptions are "{newest}" then "{oldest}""#)]
fn listed_descriptions(
    world: &TaskApiWorld,
    newest: String,
    oldest: String,
) -> Result<(), eyre::Report> {
    let body = world.last_body()?;
    let descriptions: Vec<&str> = body
        .as_array()
        .ok_or_else(|| eyre::eyre!("listing is not an array: {body}"))?
        .iter()
        .filter_map(|task| task["description"].as_str())
        .collect();
    if descriptions != [newest.as_str(), oldest.as_str()] {
        return Err(eyre::eyre!("unexpected listing order {descriptions:?}"));
    }
    Ok(())
}

#[then(r#"the error code is "{code}""#)]
fn error_code(world: &TaskApiWorld, code: String) -> Result<(), eyre::Report> {
    let body = world.last_body()?;
    if body["code"] != code.as_str() {
        return Err(eyre::eyre!("expected error code {code}, got {body}"));
    }
    Ok(())
}

#[then("the task store was never contacted")]
fn store_untouched(world: &TaskApiWorld) -> Result<(), eyre::Report> {
    let acquisitions = world.store.probe().acquisitions();
    if acquisitions != 0 {
        return Err(eyre::eyre!("store was acquired {acquisitions} times"));
    }
    Ok(())
}

#[then("every acquired session was released")]
fn sessions_released(world: &TaskApiWorld) -> Result<(), eyre::Report> {
    let outstanding = world.store.probe().outstanding();
    if outstanding != 0 {
        return Err(eyre::eyre!("{outstanding} sessions still outstanding"));
    }
    Ok(())
}
