//! Core traits and types for batch publishing
//!
//! The registry client is the seam between the orchestrator and the
//! outside world. Authentication produces an immutable [`Session`] which is
//! threaded into every publish call instead of mutating client-wide state.

use async_trait::async_trait;
use secrecy::SecretString;
use std::path::Path;

use crate::security::credentials::Credentials;

/// Registry used when none is configured
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

// ============================================================================
// Session
// ============================================================================

/// Registry context shared read-only by every publish of a batch
#[derive(Debug)]
pub struct Session {
    registry: Option<String>,
    username: Option<String>,
    email: Option<String>,
    token: Option<SecretString>,
}

impl Session {
    /// A session that publishes without authorising
    pub fn anonymous(registry: Option<&str>) -> Self {
        Self {
            registry: registry.map(String::from),
            username: None,
            email: None,
            token: None,
        }
    }

    /// A session produced by a successful login
    pub fn authenticated(
        registry: &str,
        username: &str,
        email: &str,
        token: SecretString,
    ) -> Self {
        Self {
            registry: Some(registry.to_string()),
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            token: Some(token),
        }
    }

    /// Explicitly configured registry, if any
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Registry to talk to, falling back to [`DEFAULT_REGISTRY`]
    pub fn registry_or_default(&self) -> &str {
        self.registry.as_deref().unwrap_or(DEFAULT_REGISTRY)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// ============================================================================
// Registry Client Trait
// ============================================================================

/// Client for a package registry
///
/// Implementations must be safe to call concurrently: `publish` is invoked
/// once per target, all at the same time, against the same session.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Client name (e.g., "npm")
    fn name(&self) -> &str;

    /// Perform one login exchange and return the resulting session
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry URL, `None` for the client's default
    /// * `credentials` - Complete credentials
    async fn login(
        &self,
        registry: Option<&str>,
        credentials: &Credentials,
    ) -> anyhow::Result<Session>;

    /// Publish the module in `path`
    ///
    /// An `Err` is a per-module failure; its message's first line ends up
    /// in the report.
    async fn publish(&self, session: &Session, path: &Path) -> anyhow::Result<()>;
}
