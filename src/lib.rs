//! batch-publish
//!
//! Discovers package directories, optionally logs in to the registry once,
//! publishes every package concurrently and reports what succeeded and what
//! failed.

pub mod core;
pub mod discovery;
pub mod orchestration;
pub mod plugins;
pub mod security;

pub use crate::core::*;
pub use discovery::{Candidate, Target, collect_candidates, discover_candidates, is_eligible, read_module_name};
pub use orchestration::{BatchPublisher, Outcome, PublishReport, aggregate};
pub use plugins::NpmPlugin;
pub use security::{CommandError, Credentials, SafeCommandExecutor};
