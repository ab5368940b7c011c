//! Local HTTP server for the task API.
//!
//! Reads its configuration from the environment (see [`AppConfig`]), serves
//! `/tasks` and `/health`, and shuts down gracefully on Ctrl-C.

use std::sync::Arc;

use taskboard::app::{Deployment, postgres_api};
use taskboard::config::AppConfig;
use taskboard::http::server;
use taskboard::telemetry::{LogFormat, init_tracing};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing(LogFormat::Text)?;
    let config = AppConfig::from_env()?;
    let api = Arc::new(postgres_api(&config, Deployment::LocalServer));
    server::serve(api, &config.server).await?;
    Ok(())
}
