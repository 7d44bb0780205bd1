//! Configuration structures and types for batch-publish
//!
//! `PublishConfig` is the mergeable, file-shaped layer: every field is
//! optional so that the file, environment and CLI layers can be stacked.
//! `PublishOptions` is the resolved, immutable view the orchestrator reads.

use crate::core::error::PublishError;
use crate::security::credentials::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Current configuration schema version
pub const CONFIG_VERSION: &str = "1.0";

/// Default ignore list
pub const DEFAULT_IGNORE: &[&str] = &["node_modules"];

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Schema version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Literal paths or glob patterns of candidate directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    /// Roots walked recursively for candidate directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discover: Option<Vec<String>>,

    /// Maximum depth when walking discovery roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Substrings that exclude a candidate path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,

    /// Registry URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Registry credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Run an install before publishing (accepted, not exercised)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_before: Option<bool>,

    /// Force the install (accepted, not exercised)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_install: Option<bool>,

    /// Per-publish timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl PublishConfig {
    /// The configuration written by `batch-publish init`
    pub fn template() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            sources: Some(vec!["packages/*".to_string()]),
            ignore: Some(DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()),
            install_before: Some(false),
            force_install: Some(false),
            ..Default::default()
        }
    }

    /// Resolve the layered configuration into immutable run options
    pub fn resolve(&self) -> PublishOptions {
        PublishOptions {
            ignore: self
                .ignore
                .clone()
                .unwrap_or_else(|| DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()),
            registry: self.registry.clone().filter(|r| !r.trim().is_empty()),
            auth: self.auth.clone().unwrap_or_default(),
            install_before: self.install_before.unwrap_or(false),
            force_install: self.force_install.unwrap_or(false),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Registry credentials as configured
///
/// A field holding an empty string counts as absent.
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .finish()
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

impl AuthConfig {
    /// No credential field is set
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 3
    }

    /// Names of the fields that are absent or empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("username", &self.username),
            ("password", &self.password),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Classify the configured credentials
    ///
    /// Returns `Ok(None)` when nothing is configured, the complete
    /// credentials when all three fields are set, and
    /// `IncompleteCredentials` otherwise.
    pub fn credentials(&self) -> Result<Option<Credentials>, PublishError> {
        match (
            present(&self.username),
            present(&self.password),
            present(&self.email),
        ) {
            (None, None, None) => Ok(None),
            (Some(username), Some(password), Some(email)) => {
                Ok(Some(Credentials::new(username, password, email)))
            }
            _ => Err(PublishError::IncompleteCredentials {
                missing: self
                    .missing_fields()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }),
        }
    }
}

/// Resolved options for one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOptions {
    /// Ordered ignore substrings
    pub ignore: Vec<String>,

    /// Registry URL, `None` for the client's default
    pub registry: Option<String>,

    /// Registry credentials
    pub auth: AuthConfig,

    /// Accepted for compatibility, not exercised by the publish algorithm
    pub install_before: bool,

    /// Accepted for compatibility, not exercised by the publish algorithm
    pub force_install: bool,

    /// Per-publish timeout
    pub timeout: Option<Duration>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishConfig::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(username: Option<&str>, password: Option<&str>, email: Option<&str>) -> AuthConfig {
        AuthConfig {
            username: username.map(String::from),
            password: password.map(String::from),
            email: email.map(String::from),
        }
    }

    #[test]
    fn test_default_options() {
        let options = PublishOptions::default();
        assert_eq!(options.ignore, vec!["node_modules".to_string()]);
        assert!(options.registry.is_none());
        assert!(options.auth.is_empty());
        assert!(!options.install_before);
        assert!(!options.force_install);
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_resolve_blank_registry_is_none() {
        let config = PublishConfig {
            registry: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.resolve().registry.is_none());
    }

    #[test]
    fn test_resolve_explicit_empty_ignore() {
        let config = PublishConfig {
            ignore: Some(vec![]),
            ..Default::default()
        };
        assert!(config.resolve().ignore.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
version: "1.0"
sources: ["packages/*"]
registry: https://registry.example.com/
auth:
  username: u
  password: p
  email: u@example.com
installBefore: true
timeoutSecs: 30
"#;
        let config: PublishConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.sources, Some(vec!["packages/*".to_string()]));
        assert_eq!(config.install_before, Some(true));

        let options = config.resolve();
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert!(options.auth.credentials().unwrap().is_some());
    }

    #[test]
    fn test_template_serialization() {
        let yaml = serde_yaml::to_string(&PublishConfig::template()).unwrap();
        assert!(yaml.contains("version: '1.0'"));
        assert!(yaml.contains("installBefore: false"));
        assert!(yaml.contains("- node_modules"));
        assert!(!yaml.contains("auth"));
    }

    #[test]
    fn test_empty_auth() {
        let config = AuthConfig::default();
        assert!(config.is_empty());
        assert!(config.credentials().unwrap().is_none());

        let blank = auth(Some(""), Some(""), Some(""));
        assert!(blank.is_empty());
        assert!(blank.credentials().unwrap().is_none());
    }

    #[test]
    fn test_partial_auth_is_incomplete() {
        let config = auth(Some("u"), Some(""), None);
        assert!(!config.is_empty());

        match config.credentials() {
            Err(PublishError::IncompleteCredentials { missing }) => {
                assert_eq!(missing, vec!["password".to_string(), "email".to_string()]);
            }
            other => panic!("expected IncompleteCredentials, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_two_of_three_is_incomplete() {
        let config = auth(Some("u"), Some("p"), None);
        assert!(matches!(
            config.credentials(),
            Err(PublishError::IncompleteCredentials { .. })
        ));
    }

    #[test]
    fn test_complete_auth() {
        let config = auth(Some("u"), Some("p"), Some("u@example.com"));
        let credentials = config.credentials().unwrap().unwrap();
        assert_eq!(credentials.username(), "u");
        assert_eq!(credentials.email(), "u@example.com");
    }

    #[test]
    fn test_auth_debug_redacts_password() {
        let config = auth(Some("u"), Some("hunter2"), Some("u@example.com"));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
