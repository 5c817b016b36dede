//! Profile selection, file loading and environment overlay.
//!
//! The loader reads `<dir>/config-<profile>.yml`, folds every key to its
//! lowercase alphanumeric form, then applies `APP__<SECTION>__<KEY>`
//! environment overrides on top before handing the tree to `config` for
//! typed extraction.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde_yaml::{Mapping, Value};

use super::error::ConfigLoadError;
use super::settings::Settings;

/// Selects the profile file.
pub const PROFILE_ENV_VAR: &str = "APP_ENV";

/// Overrides the configuration directory.
pub const CONFIG_DIR_ENV_VAR: &str = "APP_CONFIG_DIR";

/// Configuration directory used when [`CONFIG_DIR_ENV_VAR`] is unset,
/// relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Extension of the profile files.
pub const DEFAULT_FORMAT: &str = "yml";

/// Prefix of overlay variables; `__` also separates nested keys.
pub const OVERRIDE_PREFIX: &str = "APP__";
const OVERRIDE_SEPARATOR: &str = "__";

const SUPPORTED_FORMATS: [&str; 3] = ["yml", "yaml", "json"];

/// Deployment context selecting which file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Docker,
    Production,
}

impl Profile {
    /// Map the value of `APP_ENV` to a profile. Unknown or unset values fall
    /// back to development.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("docker") => Self::Docker,
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Base name of the profile's configuration file.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Development => "config-development",
            Self::Docker => "config-docker",
            Self::Production => "config-production",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Docker => "docker",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration directory: the given value when non-empty, otherwise
/// [`DEFAULT_CONFIG_DIR`].
pub fn resolve_config_dir(value: Option<&str>) -> PathBuf {
    match value.map(str::trim) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_CONFIG_DIR),
    }
}

/// Fold a key for case-insensitive matching: lowercase, alphanumerics only.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Dotted settings path targeted by an overlay variable, if it is one.
///
/// `APP__POSTGRES__SSL_MODE` -> `postgres.sslmode`.
pub fn override_path(name: &str) -> Option<String> {
    let rest = name.strip_prefix(OVERRIDE_PREFIX)?;
    let segments: Vec<String> = rest.split(OVERRIDE_SEPARATOR).map(fold_key).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments.join("."))
}

fn fold_value(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(fold_mapping(mapping)),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(fold_value).collect()),
        Value::Tagged(tagged) => fold_value(tagged.value),
        // A key with no value reads as empty text
        Value::Null => Value::String(String::new()),
        scalar => scalar,
    }
}

fn fold_mapping(mapping: Mapping) -> Mapping {
    let mut folded = Mapping::new();
    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                tracing::debug!(key = ?other, "Skipping non-scalar configuration key");
                continue;
            }
        };
        folded.insert(Value::String(fold_key(&key)), fold_value(value));
    }
    folded
}

/// Merged key/value data from one file plus its environment overlay.
#[derive(Debug, Clone)]
pub struct RawConfig {
    path: PathBuf,
    config: Config,
}

impl RawConfig {
    /// Build from YAML text. `path` is only used in error messages.
    pub fn from_yaml_str<I>(
        contents: &str,
        path: impl Into<PathBuf>,
        overrides: I,
    ) -> Result<Self, ConfigLoadError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let path = path.into();
        let parse_error = |message: String| ConfigLoadError::Parse {
            path: path.clone(),
            message,
        };

        let document: Value =
            serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))?;
        let folded = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => fold_mapping(mapping),
            _ => return Err(parse_error("top-level value must be a mapping".to_string())),
        };
        let normalized = serde_yaml::to_string(&Value::Mapping(folded))
            .map_err(|e| parse_error(e.to_string()))?;

        let mut builder =
            Config::builder().add_source(File::from_str(&normalized, FileFormat::Yaml));
        for (key, value) in overrides {
            builder = builder
                .set_override(key.as_str(), value)
                .map_err(|e| parse_error(e.to_string()))?;
        }
        let config = builder.build().map_err(|e| parse_error(e.to_string()))?;

        Ok(Self { path, config })
    }

    /// File this configuration was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a merged value by dotted key; segments are folded first.
    #[cfg(test)]
    fn get_string(&self, key: &str) -> Option<String> {
        let path = key.split('.').map(fold_key).collect::<Vec<_>>().join(".");
        self.config.get_string(&path).ok()
    }
}

/// Deserialize merged data into [`Settings`]. All-or-nothing: any field
/// that cannot be coerced fails the whole record.
pub fn parse(raw: RawConfig) -> Result<Settings, ConfigLoadError> {
    raw.config
        .try_deserialize::<Settings>()
        .map_err(ConfigLoadError::Unmarshal)
}

/// Loads [`Settings`] from a configuration directory and an environment
/// snapshot.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
    vars: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Loader over `dir` with an empty environment.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            vars: BTreeMap::new(),
        }
    }

    /// Loader over the process environment. The directory comes from
    /// `APP_CONFIG_DIR`, defaulting to `./config`.
    pub fn from_env() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        let dir = resolve_config_dir(vars.get(CONFIG_DIR_ENV_VAR).map(String::as_str));
        Self { dir, vars }
    }

    /// Replace the environment snapshot.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = vars
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Profile selected by `APP_ENV` in the snapshot.
    pub fn profile(&self) -> Profile {
        Profile::from_env_value(self.vars.get(PROFILE_ENV_VAR).map(String::as_str))
    }

    fn overrides(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .filter_map(|(name, value)| override_path(name).map(|path| (path, value.clone())))
            .collect()
    }

    /// Read `<dir>/<base_name>.<format>` and apply the environment overlay.
    pub fn load_file(&self, base_name: &str, format: &str) -> Result<RawConfig, ConfigLoadError> {
        if !SUPPORTED_FORMATS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(format))
        {
            return Err(ConfigLoadError::UnsupportedFormat(format.to_string()));
        }

        let file = format!("{base_name}.{format}");
        let path = self.dir.join(&file);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigLoadError::NotFound {
                    dir: self.dir.clone(),
                    file,
                });
            }
            Err(source) => return Err(ConfigLoadError::Read { path, source }),
        };

        RawConfig::from_yaml_str(&contents, path, self.overrides())
    }

    /// Select the profile, load its file and parse it.
    pub fn load(&self) -> Result<Settings, ConfigLoadError> {
        let profile = self.profile();
        let raw = self.load_file(profile.file_stem(), DEFAULT_FORMAT)?;
        let path = raw.path().to_path_buf();
        let settings = parse(raw)?;
        tracing::debug!(profile = %profile, path = %path.display(), "Settings loaded");
        Ok(settings)
    }
}
