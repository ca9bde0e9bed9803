//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$ORGDESK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/orgdesk/config.toml`
//! 3. `~/.orgdesk/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing (endpoint must be an http(s)
//! URL, page size must be in range).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Largest page size the console will request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// endpoint = "https://api.example.com/graphql"
/// page_size = 10
///
/// [secrets]
/// path = "/home/me/.orgdesk/secrets.toml"
///
/// [auth]
/// match_unauthorized_text = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// GraphQL endpoint URL
    pub endpoint: Option<String>,

    /// Items per page in listings
    pub page_size: Option<u32>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,

    /// Session error classification settings
    pub auth: Option<AuthConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint(endpoint)?;
        }

        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidValue(format!(
                    "page_size must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, size
                )));
            }
        }

        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }

        Ok(())
    }
}

/// Check that an endpoint looks like an http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidValue(format!(
            "endpoint must be an http(s) URL, got '{}'",
            endpoint
        ))),
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Override the session file location
    pub path: Option<PathBuf>,
}

impl SecretsConfig {
    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "secrets.path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Authentication error classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Treat code-less errors mentioning "unauthorized" as session loss
    pub match_unauthorized_text: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GlobalConfig::default();
        assert!(config.endpoint.is_none());
        assert!(config.page_size.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn valid_endpoint() {
        let config = GlobalConfig {
            endpoint: Some("http://localhost:3000/graphql".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_endpoint() {
        for bad in ["localhost:3000", "ftp://x", "https://", "https:///graphql"] {
            let config = GlobalConfig {
                endpoint: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn page_size_bounds() {
        let zero = GlobalConfig {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = GlobalConfig {
            page_size: Some(MAX_PAGE_SIZE + 1),
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("endpont = \"http://x\"");
        assert!(result.is_err());
    }

    #[test]
    fn roundtrip() {
        let config = GlobalConfig {
            endpoint: Some("https://api.example.com/graphql".to_string()),
            page_size: Some(25),
            secrets: Some(SecretsConfig {
                path: Some(PathBuf::from("/tmp/secrets.toml")),
            }),
            auth: Some(AuthConfig {
                match_unauthorized_text: Some(false),
            }),
        };

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
