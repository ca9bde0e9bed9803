//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Environment (`ORGDESK_GRAPHQL_URL` for the endpoint)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$ORGDESK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/orgdesk/config.toml`
//! 3. `~/.orgdesk/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use orgdesk::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Endpoint: {}", config.endpoint());
//! println!("Page size: {}", config.page_size());
//! ```

pub mod schema;

pub use schema::{AuthConfig, GlobalConfig, SecretsConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Endpoint used when neither the environment nor the config file sets one.
pub const DEFAULT_ENDPOINT: &str = "https://tglobal-assignment.onrender.com/graphql";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "ORGDESK_GRAPHQL_URL";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ORGDESK_CONFIG";

/// Listing page size when not configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration plus the environment overrides that apply to it.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file (or defaults)
    pub global: GlobalConfig,
    /// Path the config was loaded from, if any
    path: Option<PathBuf>,
    /// Endpoint from the environment, if set
    env_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let env_endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let (global, path) = match Self::find_config_file() {
            Some(path) => (Self::read_config(&path)?, Some(path)),
            None => (GlobalConfig::default(), None),
        };

        global.validate()?;
        if let Some(endpoint) = &env_endpoint {
            schema::validate_endpoint(endpoint)?;
        }

        Ok(Self {
            global,
            path,
            env_endpoint,
        })
    }

    /// Load configuration from an explicit file, ignoring the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let global = Self::read_config(path)?;
        global.validate()?;
        Ok(Self {
            global,
            path: Some(path.to_path_buf()),
            env_endpoint: None,
        })
    }

    /// Build a config from in-memory values.
    pub fn from_global(global: GlobalConfig) -> Self {
        Self {
            global,
            path: None,
            env_endpoint: None,
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("orgdesk/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".orgdesk/config.toml");
        path.exists().then_some(path)
    }

    fn read_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.orgdesk/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".orgdesk/config.toml"))
    }

    /// Path the config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write config atomically to the file it was loaded from, or to the
    /// canonical location.
    pub fn write(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => Self::global_config_path()?,
        };
        write_config_atomic(&path, &self.global)?;
        Ok(path)
    }

    // =========================================================================
    // Accessors with precedence
    // =========================================================================

    /// GraphQL endpoint: environment, then config file, then the default.
    pub fn endpoint(&self) -> &str {
        self.env_endpoint
            .as_deref()
            .or(self.global.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Items per listing page. Defaults to 10.
    pub fn page_size(&self) -> u32 {
        self.global.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Override for the session file location.
    pub fn secrets_path(&self) -> Option<&Path> {
        self.global
            .secrets
            .as_ref()
            .and_then(|s| s.path.as_deref())
    }

    /// Whether code-less "unauthorized" errors end the session.
    ///
    /// Defaults to `true`.
    pub fn match_unauthorized_text(&self) -> bool {
        self.global
            .auth
            .as_ref()
            .and_then(|a| a.match_unauthorized_text)
            .unwrap_or(true)
    }

    // =========================================================================
    // Key/value access for `orgdesk config`
    // =========================================================================

    /// Keys accepted by [`Config::get`] and [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "endpoint",
        "page_size",
        "secrets.path",
        "auth.match_unauthorized_text",
    ];

    /// Effective value for a key, rendered as a string.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "endpoint" => Ok(self.endpoint().to_string()),
            "page_size" => Ok(self.page_size().to_string()),
            "secrets.path" => Ok(self
                .secrets_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default()),
            "auth.match_unauthorized_text" => Ok(self.match_unauthorized_text().to_string()),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    /// Set a key in the file-backed config. Call [`Config::write`] to persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.global.clone();
        match key {
            "endpoint" => updated.endpoint = Some(value.to_string()),
            "page_size" => {
                let size = value.parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("page_size must be a number, got '{}'", value))
                })?;
                updated.page_size = Some(size);
            }
            "secrets.path" => {
                updated.secrets = Some(SecretsConfig {
                    path: Some(PathBuf::from(value)),
                });
            }
            "auth.match_unauthorized_text" => {
                let flag = value.parse::<bool>().map_err(|_| {
                    ConfigError::InvalidValue(format!("expected true or false, got '{}'", value))
                })?;
                updated.auth = Some(AuthConfig {
                    match_unauthorized_text: Some(flag),
                });
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        updated.validate()?;
        self.global = updated;
        Ok(())
    }
}

/// Write a config file atomically (temp file, then rename).
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_without_file() {
        let config = Config::default();
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.page_size(), 10);
        assert!(config.secrets_path().is_none());
        assert!(config.match_unauthorized_text());
    }

    #[test]
    fn environment_overrides_file_endpoint() {
        let mut config = Config::from_global(GlobalConfig {
            endpoint: Some("https://file.example.com/graphql".into()),
            ..Default::default()
        });
        assert_eq!(config.endpoint(), "https://file.example.com/graphql");

        config.env_endpoint = Some("http://localhost:4000/graphql".into());
        assert_eq!(config.endpoint(), "http://localhost:4000/graphql");
    }

    #[test]
    fn load_from_reads_and_validates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "endpoint = \"http://localhost:3000/graphql\"\npage_size = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint(), "http://localhost:3000/graphql");
        assert_eq!(config.page_size(), 5);
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "page_size = 0\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "endpoint = [").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn set_then_write_roundtrips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.set("page_size", "20").unwrap();
        config.set("auth.match_unauthorized_text", "false").unwrap();
        config.write().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.page_size(), 20);
        assert!(!reloaded.match_unauthorized_text());
    }

    #[test]
    fn set_rejects_bad_values_without_mutating() {
        let mut config = Config::default();
        assert!(config.set("page_size", "lots").is_err());
        assert!(config.set("endpoint", "not-a-url").is_err());
        assert!(matches!(
            config.set("color", "blue"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(config.global, GlobalConfig::default());
    }

    #[test]
    fn get_known_and_unknown_keys() {
        let config = Config::default();
        for key in Config::KEYS {
            assert!(config.get(key).is_ok(), "{} should be readable", key);
        }
        assert!(config.get("nope").is_err());
    }
}
