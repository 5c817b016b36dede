//! Application Startup
//!
//! Application building and server initialization. Settings are passed in
//! explicitly and shared read-only through [`AppState`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::infrastructure::{cache, database};
use crate::presentation::http::routes;
use crate::presentation::middleware::logging;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: PgPool,
    pub redis: redis::Client,
    pub started: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build client handles from the settings. No connection is opened.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let db = database::create_pool(&settings.postgres)
            .context("invalid postgres settings")?;
        let redis = cache::create_client(&settings.redis).context("invalid redis settings")?;

        Ok(Self {
            settings,
            db,
            redis,
            started: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Arc<Settings>) -> Result<Self> {
        let state = AppState::new(settings.clone())?;
        tracing::info!(
            postgres = %format!("{}:{}", settings.postgres.host, settings.postgres.port),
            redis = %format!("{}:{}", settings.redis.host, settings.redis.port),
            "Connection pools configured"
        );

        let router = routes::create_router(state).layer(logging::create_trace_layer());

        let addr = settings.server.listen_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(
            addr = %listener.local_addr()?,
            public_url = %settings.server.public_url(),
            run_mode = %settings.server.run_mode,
            "Listening"
        );

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
