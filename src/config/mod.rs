//! # Configuration Module
//!
//! Loads the server settings from a per-profile YAML file with
//! environment variable overrides.
//!
//! - `APP_ENV` picks the file: `docker` -> `config-docker.yml`,
//!   `production` -> `config-production.yml`, anything else ->
//!   `config-development.yml`
//! - `APP_CONFIG_DIR` points at the directory holding the files
//!   (default: `./config`)
//! - `APP__<SECTION>__<KEY>` overrides a single value, e.g.
//!   `APP__POSTGRES__PASSWORD=...`
//!
//! Keys are case-insensitive and ignore `_`/`-`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use server_settings::config::ConfigLoader;
//!
//! let settings = ConfigLoader::from_env().load()?;
//! println!("Listening on {}", settings.server.listen_addr()?);
//! ```

pub mod duration;
mod error;
mod loader;
mod settings;

pub use error::ConfigLoadError;
pub use loader::*;
pub use settings::*;
