//! Function entry point for the task API behind an API Gateway HTTP API.
//!
//! The database pool is created once per execution environment and reused
//! across invocations.

use std::sync::Arc;

use taskboard::app::{Deployment, postgres_api};
use taskboard::config::AppConfig;
use taskboard::http::lambda;
use taskboard::telemetry::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    init_tracing(LogFormat::Json)?;
    let config = AppConfig::from_env()?;
    let api = Arc::new(postgres_api(&config, Deployment::Function));
    lambda::run(api).await
}
