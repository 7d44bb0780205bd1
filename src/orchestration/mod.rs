//! Orchestration layer for batch publishing
//!
//! Filtering, the optional login, concurrent dispatch and report
//! aggregation, composed by [`BatchPublisher`].

pub mod authenticator;
pub mod batch_publisher;
pub mod dispatcher;
pub mod report;

// Re-export main types for convenience
pub use authenticator::Authenticator;
pub use batch_publisher::BatchPublisher;
pub use dispatcher::{Outcome, PublishDispatcher};
pub use report::{FailedModule, PublishReport, aggregate};
