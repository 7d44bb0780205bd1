//! Authenticator - the single optional login before a batch
//!
//! Partial credentials are rejected before any network call. A successful
//! login produces the [`Session`] every publish of the batch shares.

use crate::core::config::AuthConfig;
use crate::core::error::PublishError;
use crate::core::traits::{DEFAULT_REGISTRY, RegistryClient, Session};
use crate::security::credentials::mask_in_string;
use std::sync::Arc;
use tracing::{info, warn};

/// Performs the login exchange for a batch
pub struct Authenticator {
    client: Arc<dyn RegistryClient>,
}

impl Authenticator {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    /// Session used when no credentials are configured
    pub fn anonymous(registry: Option<&str>) -> Session {
        warn!("No credentials configured, attempting to publish without authorising");
        Session::anonymous(registry)
    }

    /// Log in once and return the session for the batch
    ///
    /// # Errors
    ///
    /// - `IncompleteCredentials` if only some of username/password/email are set
    /// - `AuthenticationFailed` if the registry rejects the login
    pub async fn authenticate(
        &self,
        registry: Option<&str>,
        auth: &AuthConfig,
    ) -> Result<Session, PublishError> {
        let Some(credentials) = auth.credentials()? else {
            return Ok(Self::anonymous(registry));
        };

        let target = registry.unwrap_or(DEFAULT_REGISTRY);
        info!(
            "Authorising as \"{}\" against {} ({})",
            credentials.username(),
            target,
            self.client.name()
        );

        match self.client.login(registry, &credentials).await {
            Ok(session) => {
                info!(
                    "Successfully authorised as \"{}\", attempting to publish",
                    credentials.username()
                );
                Ok(session)
            }
            Err(e) => Err(PublishError::AuthenticationFailed {
                registry: target.to_string(),
                message: mask_in_string(&format!("{:#}", e), credentials.password()),
            }),
        }
    }
}
