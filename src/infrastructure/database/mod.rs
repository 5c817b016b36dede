//! Database Module
//!
//! PostgreSQL connection options and pool built from [`PostgresSettings`].

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::config::{parse_port, PostgresSettings};

/// Settings that cannot be turned into connection options.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseConfigError {
    #[error("invalid postgres port `{0}`")]
    InvalidPort(String),

    #[error("invalid postgres sslmode `{0}`")]
    InvalidSslMode(String),
}

/// Connection options for a single PostgreSQL connection.
///
/// An empty `ssl_mode` means `prefer`.
pub fn connect_options(settings: &PostgresSettings) -> Result<PgConnectOptions, DatabaseConfigError> {
    let port = parse_port(&settings.port)
        .map_err(|_| DatabaseConfigError::InvalidPort(settings.port.clone()))?;

    let ssl_mode = if settings.ssl_mode.trim().is_empty() {
        PgSslMode::Prefer
    } else {
        settings
            .ssl_mode
            .trim()
            .parse::<PgSslMode>()
            .map_err(|_| DatabaseConfigError::InvalidSslMode(settings.ssl_mode.clone()))?
    };

    Ok(PgConnectOptions::new()
        .host(&settings.host)
        .port(port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.db_name)
        .ssl_mode(ssl_mode))
}

/// Pool sizing from the settings.
///
/// `max_open_conns` caps the pool (at least one connection); idle
/// connections are kept warm via `min_connections`, capped by the maximum.
/// A zero `conn_max_lifetime` disables connection recycling.
pub fn pool_options(settings: &PostgresSettings) -> PgPoolOptions {
    let max_connections = settings.max_open_conns.max(1);
    let min_connections = settings.max_idle_conns.min(max_connections);
    let max_lifetime =
        (!settings.conn_max_lifetime.is_zero()).then_some(settings.conn_max_lifetime);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .max_lifetime(max_lifetime)
}

/// Create a PostgreSQL pool. Connections are opened on first use.
pub fn create_pool(settings: &PostgresSettings) -> Result<PgPool, DatabaseConfigError> {
    let options = connect_options(settings)?;
    Ok(pool_options(settings).connect_lazy_with(options))
}
