//! Publish Dispatcher - Runs every publish of a batch concurrently
//!
//! One task per target, no concurrency limit, no fail-fast. Outcomes are
//! collected by the calling task as the publishes settle, so the returned
//! order is arrival order. The call returns only once every task has
//! settled.

use crate::core::error::PublishError;
use crate::core::traits::{RegistryClient, Session};
use crate::discovery::Target;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Result of one publish attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success { module: String },
    Failure { module: String, reason: String },
}

impl Outcome {
    /// Classify a publish result; failures keep only the first line of
    /// the error message
    pub fn from_result(module: &str, result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success {
                module: module.to_string(),
            },
            Err(e) => Outcome::Failure {
                module: module.to_string(),
                reason: first_line(&format!("{:#}", e)).to_string(),
            },
        }
    }

    pub fn module(&self) -> &str {
        match self {
            Outcome::Success { module } | Outcome::Failure { module, .. } => module,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { module } => write!(f, "{}", module),
            Outcome::Failure { module, reason } => write!(f, "{} ({})", module, reason),
        }
    }
}

/// First line of an error message
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("").trim_end()
}

/// PublishDispatcher - fans publishes out and joins them
pub struct PublishDispatcher {
    client: Arc<dyn RegistryClient>,
    timeout: Option<Duration>,
}

impl PublishDispatcher {
    /// Create a dispatcher without a per-publish timeout
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Limit how long a single publish may take
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish every target concurrently and return one outcome per target
    pub async fn dispatch_all(&self, session: Arc<Session>, targets: Vec<Target>) -> Vec<Outcome> {
        let mut join_set = JoinSet::new();
        let mut pending: Vec<Option<String>> = Vec::with_capacity(targets.len());

        for (index, target) in targets.into_iter().enumerate() {
            pending.push(Some(target.name().to_string()));

            let client = Arc::clone(&self.client);
            let session = Arc::clone(&session);
            let timeout = self.timeout;

            join_set.spawn(async move {
                (index, publish_one(client, session, target, timeout).await)
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    pending[index] = None;
                    outcomes.push(outcome);
                }
                Err(e) => error!("Publish task did not complete: {}", e),
            }
        }

        // Tasks that panicked never reported back
        for module in pending.into_iter().flatten() {
            error!("Unable to publish {} (publish task panicked)", module);
            outcomes.push(Outcome::Failure {
                module,
                reason: "publish task panicked".to_string(),
            });
        }

        outcomes
    }
}

async fn publish_one(
    client: Arc<dyn RegistryClient>,
    session: Arc<Session>,
    target: Target,
    timeout: Option<Duration>,
) -> Outcome {
    let publish = client.publish(&session, target.path());

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, publish).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("timed out after {:?}", limit)),
        },
        None => publish.await,
    };

    let outcome = Outcome::from_result(target.name(), result);
    match &outcome {
        Outcome::Success { module } => info!("{} published successfully", module),
        Outcome::Failure { module, reason } => {
            let failure = PublishError::PublishFailed {
                module: module.clone(),
                message: reason.clone(),
            };
            error!(code = failure.code(), "{}", failure)
        }
    }
    outcome
}
