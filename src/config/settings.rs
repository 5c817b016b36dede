//! Application settings and configuration structures.
//!
//! Field names are matched against folded keys (lowercase, no `_` or `-`),
//! so `InternalPort`, `internal_port` and `INTERNAL-PORT` all land in
//! [`ServerSettings::internal_port`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration;

/// Placeholder written over secrets by [`Settings::redacted`].
pub const REDACTED: &str = "[redacted]";

/// Root configuration structure, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP listener identity
    pub server: ServerSettings,

    /// PostgreSQL connection
    pub postgres: PostgresSettings,

    /// Redis connection
    pub redis: RedisSettings,

    /// Logger output
    pub logger: LoggerSettings,
}

/// Server identity and listener ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port the process binds to
    #[serde(rename = "internalport")]
    pub internal_port: String,

    /// Public port advertised to clients
    pub port: String,

    /// Port exposed outside the container or host
    #[serde(rename = "externalport")]
    pub external_port: String,

    /// Run mode (e.g. "debug", "release")
    #[serde(rename = "runmode")]
    pub run_mode: String,

    /// Public domain name
    pub domain: String,
}

/// PostgreSQL connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresSettings {
    pub host: String,

    pub port: String,

    pub user: String,

    pub password: String,

    #[serde(rename = "dbname")]
    pub db_name: String,

    /// libpq-style `sslmode` (disable, prefer, require, ...)
    #[serde(rename = "sslmode")]
    pub ssl_mode: String,

    /// Connections kept open while idle
    #[serde(rename = "maxidleconns")]
    pub max_idle_conns: u32,

    /// Upper bound on open connections
    #[serde(rename = "maxopenconns")]
    pub max_open_conns: u32,

    /// Maximum lifetime of a single connection (zero disables the limit)
    #[serde(rename = "connmaxlifetime", with = "duration")]
    pub conn_max_lifetime: Duration,
}

/// Redis connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    pub host: String,

    pub port: String,

    pub password: String,

    /// Logical database selector
    pub db: String,

    #[serde(rename = "dialtimeout", with = "duration")]
    pub dial_timeout: Duration,

    #[serde(rename = "readtimeout", with = "duration")]
    pub read_timeout: Duration,

    #[serde(rename = "writetimeout", with = "duration")]
    pub write_timeout: Duration,

    #[serde(rename = "idlecheckfrequency", with = "duration")]
    pub idle_check_frequency: Duration,

    #[serde(rename = "poolsize")]
    pub pool_size: u32,

    #[serde(rename = "pooltimeout", with = "duration")]
    pub pool_timeout: Duration,
}

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log file; empty writes to stdout
    #[serde(rename = "filepath")]
    pub file_path: String,

    /// "json" or "console"
    pub encoding: String,

    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,

    /// Formatter flavour for console output (full, compact, pretty)
    pub logger: String,
}

/// Error returned when a textual port cannot be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid port `{0}`")]
pub struct InvalidPort(pub String);

impl Settings {
    /// Copy of the settings with passwords replaced, safe to log.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        if !settings.postgres.password.is_empty() {
            settings.postgres.password = REDACTED.to_string();
        }
        if !settings.redis.password.is_empty() {
            settings.redis.password = REDACTED.to_string();
        }
        settings
    }
}

impl ServerSettings {
    /// Socket address the HTTP listener binds to (all interfaces, internal port).
    pub fn listen_addr(&self) -> Result<SocketAddr, InvalidPort> {
        let port = parse_port(&self.internal_port)?;
        Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
    }

    /// URL under which the server is reachable from outside.
    pub fn public_url(&self) -> String {
        if self.external_port.is_empty() {
            format!("http://{}", self.domain)
        } else {
            format!("http://{}:{}", self.domain, self.external_port)
        }
    }
}

/// Parse a textual port number.
pub fn parse_port(port: &str) -> Result<u16, InvalidPort> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| InvalidPort(port.to_string()))
}
