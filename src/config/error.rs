//! Configuration loading errors.

use std::path::PathBuf;

/// Failure while turning a configuration file into [`Settings`](super::Settings).
///
/// Nothing in the crate recovers from these; the binary logs the error and
/// exits.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("config file {file} not found in {}", .dir.display())]
    NotFound { dir: PathBuf, file: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format `{0}` (expected yml, yaml or json)")]
    UnsupportedFormat(String),

    #[error("failed to unmarshal settings: {0}")]
    Unmarshal(#[source] config::ConfigError),
}

impl ConfigLoadError {
    /// Short failure name for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "config_not_found",
            Self::Read { .. } => "config_read_error",
            Self::Parse { .. } => "config_parse_error",
            Self::UnsupportedFormat(_) => "config_unsupported_format",
            Self::Unmarshal(_) => "config_unmarshal_error",
        }
    }
}
