//! Common Test Utilities
//!
//! Shared fixtures and test infrastructure.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use server_settings::config::{
    LoggerSettings, PostgresSettings, RedisSettings, ServerSettings, Settings,
};
use server_settings::presentation::http::routes;
use server_settings::startup::AppState;

/// Settings with every field set to a distinct value. Backing services
/// point at a closed local port so probes fail fast.
pub fn sample_settings() -> Settings {
    Settings {
        server: ServerSettings {
            internal_port: "0".into(),
            port: "8080".into(),
            external_port: "8443".into(),
            run_mode: "test".into(),
            domain: "example.test".into(),
        },
        postgres: PostgresSettings {
            host: "127.0.0.1".into(),
            port: "1".into(),
            user: "tester".into(),
            password: "pg-secret".into(),
            db_name: "test_db".into(),
            ssl_mode: "disable".into(),
            max_idle_conns: 0,
            max_open_conns: 4,
            conn_max_lifetime: Duration::from_secs(90),
        },
        redis: RedisSettings {
            host: "127.0.0.1".into(),
            port: "1".into(),
            password: "redis-secret".into(),
            db: "1".into(),
            dial_timeout: Duration::from_millis(250),
            read_timeout: Duration::from_millis(250),
            write_timeout: Duration::from_millis(300),
            idle_check_frequency: Duration::from_millis(1500),
            pool_size: 7,
            pool_timeout: Duration::from_secs(4),
        },
        logger: LoggerSettings {
            file_path: "logs/test.log".into(),
            encoding: "json".into(),
            level: "warn".into(),
            logger: "compact".into(),
        },
    }
}

/// Write `settings` as `<dir>/<stem>.yml`.
pub fn write_profile(dir: &Path, stem: &str, settings: &Settings) {
    let yaml = serde_yaml::to_string(settings).unwrap();
    std::fs::write(dir.join(format!("{stem}.yml")), yaml).unwrap();
}

/// Test application serving the real router
pub struct TestApp {
    pub server: TestServer,
    pub settings: Arc<Settings>,
}

impl TestApp {
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        let state = AppState::new(settings.clone()).unwrap();
        let server = TestServer::new(routes::create_router(state)).unwrap();
        Self { server, settings }
    }
}
