//! Error handling for batch publishing
//!
//! Fatal errors abort the whole batch before any publish is dispatched.
//! Per-module publish errors are non-fatal: they are summarized into the
//! final report and never cancel sibling publishes.

use crate::core::state_machine::RunState;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for batch publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Pre-flight errors
    #[error("Incomplete credentials: missing {}", missing.join(", "))]
    IncompleteCredentials { missing: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    // Authentication errors
    #[error("[{registry}] Authentication failed: {message}")]
    AuthenticationFailed { registry: String, message: String },

    // Per-module errors
    #[error("Unable to publish {module}: {message}")]
    PublishFailed { module: String, message: String },

    #[error("Unable to read manifest in {}: {message}", path.display())]
    ManifestRead { path: PathBuf, message: String },

    // Orchestration errors
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: RunState, to: RunState },
}

impl PublishError {
    /// Whether this error aborts the entire batch.
    ///
    /// Publish and manifest errors only affect a single module and are
    /// recorded rather than propagated.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::PublishFailed { .. } | Self::ManifestRead { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::IncompleteCredentials { .. } => vec![
                "Provide username, password and email together",
                "Or remove the auth section to publish anonymously",
            ],
            Self::Config(_) => vec![
                "Check .publish-config.yaml for syntax errors",
                "Run `batch-publish init` to generate a default configuration",
            ],
            Self::AuthenticationFailed { .. } => vec![
                "Check the username and password",
                "Check that the registry URL is correct and reachable",
            ],
            Self::PublishFailed { .. } => vec![
                "Check that the version has not already been published",
                "Check that you have publish rights for this package",
            ],
            Self::ManifestRead { .. } => {
                vec!["Check that package.json is valid JSON with a \"name\" field"]
            }
            Self::InvalidTransition { .. } => vec!["This is a bug, please report it"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompleteCredentials { .. } => "INCOMPLETE_CREDENTIALS",
            Self::Config(_) => "CONFIG_ERROR",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::PublishFailed { .. } => "PUBLISH_FAILED",
            Self::ManifestRead { .. } => "MANIFEST_READ_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_credentials_error() {
        let error = PublishError::IncompleteCredentials {
            missing: vec!["password".to_string(), "email".to_string()],
        };

        assert!(error.is_fatal());
        assert_eq!(error.code(), "INCOMPLETE_CREDENTIALS");
        assert_eq!(
            error.to_string(),
            "Incomplete credentials: missing password, email"
        );
    }

    #[test]
    fn test_authentication_failed_error() {
        let error = PublishError::AuthenticationFailed {
            registry: "https://registry.npmjs.org/".to_string(),
            message: "401 Unauthorized".to_string(),
        };

        assert!(error.is_fatal());
        assert_eq!(error.code(), "AUTHENTICATION_FAILED");
        let display = error.to_string();
        assert!(display.contains("registry.npmjs.org"));
        assert!(display.contains("401 Unauthorized"));
    }

    #[test]
    fn test_publish_failed_is_not_fatal() {
        let error = PublishError::PublishFailed {
            module: "pkg-a".to_string(),
            message: "403 Forbidden".to_string(),
        };

        assert!(!error.is_fatal());
        assert_eq!(error.code(), "PUBLISH_FAILED");
    }

    #[test]
    fn test_manifest_read_is_not_fatal() {
        let error = PublishError::ManifestRead {
            path: PathBuf::from("/tmp/pkg"),
            message: "missing field `name`".to_string(),
        };

        assert!(!error.is_fatal());
        assert!(error.to_string().contains("/tmp/pkg"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = PublishError::InvalidTransition {
            from: RunState::Done,
            to: RunState::Filtering,
        };

        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "Invalid state transition: Done -> Filtering");
    }

    #[test]
    fn test_every_error_has_suggestions() {
        let errors = vec![
            PublishError::IncompleteCredentials { missing: vec![] },
            PublishError::Config("bad".to_string()),
            PublishError::AuthenticationFailed {
                registry: "r".to_string(),
                message: "m".to_string(),
            },
            PublishError::PublishFailed {
                module: "m".to_string(),
                message: "m".to_string(),
            },
            PublishError::ManifestRead {
                path: PathBuf::from("p"),
                message: "m".to_string(),
            },
        ];

        for error in errors {
            assert!(!error.suggested_actions().is_empty(), "{}", error.code());
        }
    }
}
