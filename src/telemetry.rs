//! Telemetry and Observability
//!
//! Structured logging set up from the `Logger` settings section.

use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggerSettings;

/// Logger set-up failure.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("unknown log level `{0}`")]
    InvalidLevel(String),

    #[error("unknown log encoding `{0}` (expected json or console)")]
    InvalidEncoding(String),

    #[error("unknown logger `{0}` (expected full, compact or pretty)")]
    InvalidLogger(String),

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEncoding {
    Json,
    Console,
}

impl FromStr for LogEncoding {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "" | "console" | "text" => Ok(Self::Console),
            _ => Err(TelemetryError::InvalidEncoding(s.to_string())),
        }
    }
}

/// Console formatter flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "full" | "tracing" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(TelemetryError::InvalidLogger(s.to_string())),
        }
    }
}

/// Parse a level name. Empty means `info`; zap-style `fatal`/`panic`
/// collapse to `error`.
pub fn parse_level(level: &str) -> Result<LevelFilter, TelemetryError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "" => Ok(LevelFilter::INFO),
        "warning" => Ok(LevelFilter::WARN),
        "fatal" | "panic" | "dpanic" => Ok(LevelFilter::ERROR),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| TelemetryError::InvalidLevel(level.to_string())),
    }
}

fn make_writer(file_path: &str) -> Result<(BoxMakeWriter, bool), TelemetryError> {
    let file_path = file_path.trim();
    if file_path.is_empty() {
        return Ok((BoxMakeWriter::new(std::io::stdout), true));
    }

    let open = || -> std::io::Result<std::fs::File> {
        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(file_path)
    };
    let file = open().map_err(|source| TelemetryError::LogFile {
        path: file_path.to_string(),
        source,
    })?;
    Ok((BoxMakeWriter::new(Arc::new(file)), false))
}

/// Build the formatting layer described by `settings`, filtered by
/// `RUST_LOG` falling back to the configured level.
pub fn build_layer(
    settings: &LoggerSettings,
) -> Result<Box<dyn Layer<Registry> + Send + Sync>, TelemetryError> {
    let level = parse_level(&settings.level)?;
    let encoding: LogEncoding = settings.encoding.parse()?;
    let format: LogFormat = settings.logger.parse()?;
    let (writer, ansi) = make_writer(&settings.file_path)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (encoding, format) {
        (LogEncoding::Json, _) => fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (LogEncoding::Console, LogFormat::Full) => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (LogEncoding::Console, LogFormat::Compact) => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        (LogEncoding::Console, LogFormat::Pretty) => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    };

    Ok(layer.with_filter(env_filter).boxed())
}

/// Initialize the global tracing subscriber from the logger settings.
pub fn init_tracing(settings: &LoggerSettings) -> Result<(), TelemetryError> {
    let layer = build_layer(settings)?;

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(
        level = %settings.level,
        encoding = %settings.encoding,
        "Tracing initialized"
    );
    Ok(())
}

/// Stderr subscriber for use before settings are available.
pub fn init_bootstrap_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn logger(file_path: &str, encoding: &str, level: &str, logger: &str) -> LoggerSettings {
        LoggerSettings {
            file_path: file_path.into(),
            encoding: encoding.into(),
            level: level.into(),
            logger: logger.into(),
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("fatal").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("").unwrap(), LevelFilter::INFO);
        assert!(matches!(
            parse_level("loud"),
            Err(TelemetryError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_encoding_and_format_names() {
        assert_eq!("json".parse::<LogEncoding>().unwrap(), LogEncoding::Json);
        assert_eq!("Console".parse::<LogEncoding>().unwrap(), LogEncoding::Console);
        assert_eq!("".parse::<LogEncoding>().unwrap(), LogEncoding::Console);
        assert!("xml".parse::<LogEncoding>().is_err());

        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("zap".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_build_layer_rejects_unknown_encoding() {
        let err = build_layer(&logger("", "xml", "info", "full")).err().unwrap();
        assert!(matches!(err, TelemetryError::InvalidEncoding(_)));
    }

    #[test]
    fn test_log_file_is_created_with_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("server.log");
        build_layer(&logger(path.to_str().unwrap(), "json", "info", "full")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_json_events_reach_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.log");
        let layer = build_layer(&logger(path.to_str().unwrap(), "json", "info", "")).unwrap();

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(port = 8080, "listener ready");
            tracing::debug!("filtered out");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["fields"]["message"], "listener ready");
        assert_eq!(event["fields"]["port"], 8080);
        assert!(!contents.contains("filtered out"));
    }
}
