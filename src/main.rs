//! # Server
//!
//! Application entry point:
//! - Configuration loading (`APP_ENV`, `APP_CONFIG_DIR`, `APP__*` overrides)
//! - Tracing/logging subsystem from the `Logger` section
//! - PostgreSQL pool and Redis client
//! - HTTP health endpoints

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use server_settings::config::ConfigLoader;
use server_settings::startup::Application;
use server_settings::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    let loader = ConfigLoader::from_env();
    let settings = match loader.load() {
        Ok(settings) => Arc::new(settings),
        Err(err) => {
            telemetry::init_bootstrap_tracing();
            error!(
                kind = err.kind(),
                profile = %loader.profile(),
                dir = %loader.dir().display(),
                error = %err,
                "Failed to load configuration"
            );
            std::process::exit(1);
        }
    };

    telemetry::init_tracing(&settings.logger)?;
    info!(
        profile = %loader.profile(),
        dir = %loader.dir().display(),
        settings = ?settings.redacted(),
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
