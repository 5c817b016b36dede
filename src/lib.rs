//! # Server Settings
//!
//! Typed configuration for a server process backed by PostgreSQL and
//! Redis:
//! - per-profile YAML files (`config-development.yml`, `config-docker.yml`,
//!   `config-production.yml`) selected by `APP_ENV`
//! - environment variable overrides (`APP__<SECTION>__<KEY>`)
//! - structured logging configured from the `Logger` section
//! - a small HTTP server exposing health probes
//!
//! ## Module Structure
//!
//! ```text
//! server_settings/
//! +-- config/         Settings types, loader, duration parsing
//! +-- infrastructure/ PostgreSQL pool and Redis client from settings
//! +-- presentation/   HTTP routes and middleware
//! +-- startup         Application wiring
//! +-- telemetry       Tracing subscriber set-up
//! ```

// Configuration module
pub mod config;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
