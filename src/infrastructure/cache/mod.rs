//! Cache Module
//!
//! Redis client built from [`RedisSettings`].
//!
//! The client does not connect until used. Async connections opened through
//! [`connect`] are bounded by `dial_timeout` while connecting and by
//! `read_timeout` for every command reply. A zero timeout means no bound.

use redis::aio::MultiplexedConnection;
use redis::{AsyncConnectionConfig, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use crate::config::{parse_port, RedisSettings};

/// Redis setup or health check failure.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid redis port `{0}`")]
    InvalidPort(String),

    #[error("invalid redis database `{0}`")]
    InvalidDatabase(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Connection target for the settings. An empty `db` selects database 0
/// and an empty password disables `AUTH`.
pub fn connection_info(settings: &RedisSettings) -> Result<ConnectionInfo, CacheError> {
    let port = parse_port(&settings.port)
        .map_err(|_| CacheError::InvalidPort(settings.port.clone()))?;

    let db = settings.db.trim();
    let db = if db.is_empty() {
        0
    } else {
        db.parse::<i64>()
            .map_err(|_| CacheError::InvalidDatabase(settings.db.clone()))?
    };

    let password = (!settings.password.is_empty()).then(|| settings.password.clone());

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(settings.host.clone(), port),
        redis: RedisConnectionInfo {
            db,
            password,
            ..Default::default()
        },
    })
}

/// Connection and response timeouts for async connections.
pub fn async_connection_config(settings: &RedisSettings) -> AsyncConnectionConfig {
    let mut config = AsyncConnectionConfig::new();
    if !settings.dial_timeout.is_zero() {
        config = config.set_connection_timeout(settings.dial_timeout);
    }
    if !settings.read_timeout.is_zero() {
        config = config.set_response_timeout(settings.read_timeout);
    }
    config
}

/// Create a Redis client. No connection is opened.
pub fn create_client(settings: &RedisSettings) -> Result<Client, CacheError> {
    Ok(Client::open(connection_info(settings)?)?)
}

/// Open a multiplexed connection with the configured timeouts.
pub async fn connect(
    client: &Client,
    settings: &RedisSettings,
) -> Result<MultiplexedConnection, CacheError> {
    let config = async_connection_config(settings);
    Ok(client
        .get_multiplexed_async_connection_with_config(&config)
        .await?)
}

/// Round-trip a PING to the server.
pub async fn ping(client: &Client, settings: &RedisSettings) -> Result<(), CacheError> {
    let mut conn = connect(client, settings).await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}
