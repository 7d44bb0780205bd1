//! Batch Publisher - Publishes every eligible directory of a batch
//!
//! Features:
//! - Candidate filtering (ignore list, manifest presence)
//! - A single optional login before any publish
//! - Concurrent publishing with isolated failures
//! - A deterministic success/failure report

use crate::core::config::PublishOptions;
use crate::core::error::PublishError;
use crate::core::state_machine::{RunState, RunStateMachine};
use crate::core::traits::{RegistryClient, Session};
use crate::discovery::{Candidate, Target, has_manifest, ignored_by, read_module_name};
use crate::orchestration::authenticator::Authenticator;
use crate::orchestration::dispatcher::{Outcome, PublishDispatcher};
use crate::orchestration::report::{PublishReport, aggregate};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// BatchPublisher - Orchestrates one batch run
pub struct BatchPublisher {
    client: Arc<dyn RegistryClient>,
    options: PublishOptions,
}

impl BatchPublisher {
    /// Create a new BatchPublisher
    ///
    /// # Arguments
    ///
    /// * `client` - Registry client used for login and publish
    /// * `options` - Resolved options for the run
    pub fn new(client: Arc<dyn RegistryClient>, options: PublishOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Filter candidates down to publishable targets, in candidate order
    ///
    /// Ignore entries are matched against each candidate's path as
    /// written. Ignored paths and directories without a manifest are
    /// skipped silently; an unreadable manifest is skipped with a warning.
    pub fn select_targets(&self, candidates: &[Candidate]) -> Vec<Target> {
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut targets = Vec::new();

        for candidate in candidates {
            let path = candidate.path();
            if !seen.insert(path) {
                continue;
            }

            if let Some(pattern) = ignored_by(candidate.source(), &self.options.ignore) {
                debug!(
                    "Skipping {} (ignored by \"{}\")",
                    candidate.source().display(),
                    pattern
                );
                continue;
            }

            if !has_manifest(path) {
                debug!("Skipping {} (no manifest)", candidate.source().display());
                continue;
            }

            match read_module_name(path) {
                Ok(name) => {
                    info!("Publishing {} ({}) ...", name, path.display());
                    targets.push(Target::new(path, name));
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        targets
    }

    /// Run the batch over `candidates`
    ///
    /// # Returns
    ///
    /// The report of every attempted publish. Individual publish failures
    /// are part of the report; only fatal conditions are returned as errors.
    ///
    /// # Errors
    ///
    /// - `IncompleteCredentials` / `AuthenticationFailed` (nothing is published)
    pub async fn publish_all(&self, candidates: &[Candidate]) -> Result<PublishReport, PublishError> {
        let mut machine = RunStateMachine::new();
        self.run(candidates, &mut machine).await
    }

    async fn run(
        &self,
        candidates: &[Candidate],
        machine: &mut RunStateMachine,
    ) -> Result<PublishReport, PublishError> {
        if self.options.install_before || self.options.force_install {
            warn!("installBefore/forceInstall are accepted but no install is performed");
        }

        machine.transition(RunState::Filtering)?;
        let targets = self.select_targets(candidates);
        info!("{} eligible of {} candidates", targets.len(), candidates.len());

        let registry = self.options.registry.as_deref();
        let session = if self.options.auth.is_empty() {
            Authenticator::anonymous(registry)
        } else {
            machine.transition(RunState::Authenticating)?;
            let authenticator = Authenticator::new(Arc::clone(&self.client));
            match authenticator.authenticate(registry, &self.options.auth).await {
                Ok(session) => session,
                Err(e) => {
                    machine.transition(RunState::Done)?;
                    return Err(e);
                }
            }
        };

        machine.transition(RunState::Dispatching)?;
        let outcomes = self.dispatch(session, targets).await;

        machine.transition(RunState::Aggregating)?;
        let report = aggregate(&outcomes);

        machine.transition(RunState::Done)?;
        Ok(report)
    }

    async fn dispatch(&self, session: Session, targets: Vec<Target>) -> Vec<Outcome> {
        PublishDispatcher::new(Arc::clone(&self.client))
            .with_timeout(self.options.timeout)
            .dispatch_all(Arc::new(session), targets)
            .await
    }
}
