mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use value::{ConfigValue, FromConfigValue};

/// Error type for loader settings.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while reading settings files.
    Load(String),
    /// `wayfinder.file_pattern` is not a valid regular expression.
    InvalidPattern { pattern: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::InvalidPattern { pattern, message } => {
                write!(f, "Invalid file pattern '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const EXTENSION_KEY: &str = "wayfinder.extension";
pub const FILE_PATTERN_KEY: &str = "wayfinder.file_pattern";
pub const REQUIRE_DECORATOR_KEY: &str = "wayfinder.require_controller_decorator";
pub const CWD_KEY: &str = "wayfinder.cwd";

/// Loader settings read from YAML files, `.env` files and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `wayfinder.yaml` (base)
/// 2. `wayfinder-{profile}.yaml` (profile override)
/// 3. `.env` file (loaded into process environment)
/// 4. `.env.{profile}` file (loaded into process environment)
/// 5. Environment variables (`WAYFINDER_EXTENSION` overrides `wayfinder.extension`)
///
/// `.env` files never overwrite already-set environment variables.
///
/// Profile is determined by: `WAYFINDER_PROFILE` env var > argument.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl LoaderSettings {
    /// Load settings for `profile` from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load settings for `profile` from the files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("WAYFINDER_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("wayfinder.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("wayfinder-{active_profile}.yaml")),
            &mut values,
        )?;

        // Missing .env files are fine.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(std::env::vars(), &mut values);

        Ok(LoaderSettings {
            values,
            profile: active_profile,
        })
    }

    /// Build settings from a YAML string, without touching the environment.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(LoaderSettings {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        LoaderSettings {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Like [`get`](Self::get), but a missing key yields `Ok(None)`.
    pub fn get_opt<V: FromConfigValue>(&self, key: &str) -> Result<Option<V>, ConfigError> {
        match self.values.get(key) {
            Some(value) => Option::<V>::from_config_value(value, key),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// File extension of controller modules. Defaults to `.rs`.
    pub fn extension(&self) -> Result<String, ConfigError> {
        Ok(self
            .get_opt(EXTENSION_KEY)?
            .unwrap_or_else(|| crate::options::DEFAULT_EXTENSION.to_string()))
    }

    pub fn file_pattern(&self) -> Result<Option<String>, ConfigError> {
        self.get_opt(FILE_PATTERN_KEY)
    }

    pub fn require_controller_decorator(&self) -> Result<bool, ConfigError> {
        Ok(self.get_opt(REQUIRE_DECORATOR_KEY)?.unwrap_or(false))
    }

    pub fn cwd(&self) -> Result<Option<PathBuf>, ConfigError> {
        Ok(self.get_opt::<String>(CWD_KEY)?.map(PathBuf::from))
    }
}
