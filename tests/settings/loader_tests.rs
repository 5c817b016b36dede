//! Configuration Loading Tests

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use server_settings::config::{ConfigLoadError, ConfigLoader, Profile, REDACTED};
use tempfile::TempDir;
use test_case::test_case;

use crate::common::{sample_settings, write_profile};

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

/// Every field written to a profile file comes back unchanged
#[test]
fn test_settings_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let expected = sample_settings();
    write_profile(dir.path(), "config-development", &expected);

    let loaded = ConfigLoader::new(dir.path()).load().unwrap();

    assert_eq!(loaded, expected);
}

/// Each profile reads its own file
#[test_case("docker", "config-docker")]
#[test_case("production", "config-production")]
#[test_case("", "config-development")]
#[test_case("staging", "config-development")]
fn test_app_env_selects_profile_file(app_env: &str, stem: &str) {
    let dir = TempDir::new().unwrap();
    for profile in [Profile::Development, Profile::Docker, Profile::Production] {
        let mut settings = sample_settings();
        settings.server.domain = profile.file_stem().to_string();
        write_profile(dir.path(), profile.file_stem(), &settings);
    }

    let loaded = ConfigLoader::new(dir.path())
        .with_vars([("APP_ENV", app_env)])
        .load()
        .unwrap();

    assert_eq!(loaded.server.domain, stem);
}

/// Environment values win over file values
#[test]
fn test_environment_overlay_wins() {
    let dir = TempDir::new().unwrap();
    write_profile(dir.path(), "config-production", &sample_settings());

    let loaded = ConfigLoader::new(dir.path())
        .with_vars([
            ("APP_ENV", "production"),
            ("APP__POSTGRES__HOST", "db.prod"),
            ("APP__POSTGRES__MAX_IDLE_CONNS", "3"),
            ("APP__REDIS__POOL_TIMEOUT", "1m"),
            ("APP__LOGGER__LEVEL", "error"),
        ])
        .load()
        .unwrap();

    assert_eq!(loaded.postgres.host, "db.prod");
    assert_eq!(loaded.postgres.max_idle_conns, 3);
    assert_eq!(loaded.redis.pool_timeout, Duration::from_secs(60));
    assert_eq!(loaded.logger.level, "error");
    assert_eq!(loaded.postgres.user, sample_settings().postgres.user);
}

/// A missing profile file names the searched directory
#[test]
fn test_missing_profile_file() {
    let dir = TempDir::new().unwrap();
    write_profile(dir.path(), "config-development", &sample_settings());

    let err = ConfigLoader::new(dir.path())
        .with_vars([("APP_ENV", "docker")])
        .load()
        .unwrap_err();

    match &err {
        ConfigLoadError::NotFound { dir: searched, file } => {
            assert_eq!(searched.as_path(), dir.path());
            assert_eq!(file, "config-docker.yml");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(err.to_string().contains(&dir.path().display().to_string()));
}

/// Bad typed values fail the whole load
#[test]
fn test_uncoercible_value_fails_load() {
    let dir = TempDir::new().unwrap();
    write_profile(dir.path(), "config-development", &sample_settings());

    let err = ConfigLoader::new(dir.path())
        .with_vars([("APP__REDIS__READ_TIMEOUT", "a while")])
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::Unmarshal(_)), "{err}");
}

/// Loading twice from the same state yields equal settings
#[test]
fn test_load_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_profile(dir.path(), "config-development", &sample_settings());
    let loader = ConfigLoader::new(dir.path()).with_vars([("APP__SERVER__DOMAIN", "env.test")]);

    assert_eq!(loader.load().unwrap(), loader.load().unwrap());
}

/// The profile files shipped in `config/` all load
#[test_case("development")]
#[test_case("docker")]
#[test_case("production")]
fn test_shipped_profiles_load(app_env: &str) {
    let settings = ConfigLoader::new(shipped_config_dir())
        .with_vars([("APP_ENV", app_env)])
        .load()
        .unwrap();

    assert_eq!(settings.server.internal_port, "5005");
    assert_eq!(settings.postgres.conn_max_lifetime, Duration::from_secs(300));
    assert_eq!(settings.redis.idle_check_frequency, Duration::from_millis(500));
    assert!(settings.server.listen_addr().is_ok());
}

/// Redaction masks secrets and nothing else
#[test]
fn test_redacted_settings() {
    let settings = sample_settings();
    let redacted = settings.redacted();

    assert_eq!(redacted.postgres.password, REDACTED);
    assert_eq!(redacted.redis.password, REDACTED);
    assert_eq!(redacted.postgres.user, settings.postgres.user);
    assert_eq!(redacted.server, settings.server);
    assert!(!format!("{redacted:?}").contains("pg-secret"));
}
