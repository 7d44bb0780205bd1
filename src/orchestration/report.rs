//! Report aggregation and rendering

use crate::orchestration::dispatcher::Outcome;
use serde::Serialize;
use std::fmt;

/// A module that could not be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedModule {
    pub module: String,
    pub reason: String,
}

impl fmt::Display for FailedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.module, self.reason)
    }
}

/// Partitioned outcomes of a batch, both sides in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PublishReport {
    /// Successfully published modules
    pub succeeded: Vec<String>,

    /// Failed modules with the first line of their error
    pub failed: Vec<FailedModule>,
}

/// Partition outcomes by variant, preserving their relative order
pub fn aggregate(outcomes: &[Outcome]) -> PublishReport {
    let mut report = PublishReport::default();

    for outcome in outcomes {
        match outcome {
            Outcome::Success { module } => report.succeeded.push(module.clone()),
            Outcome::Failure { module, reason } => report.failed.push(FailedModule {
                module: module.clone(),
                reason: reason.clone(),
            }),
        }
    }

    report
}

impl PublishReport {
    /// Number of outcomes the report was built from
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// No module failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// `"name (reason)"` for every failed module
    pub fn failure_lines(&self) -> Vec<String> {
        self.failed.iter().map(ToString::to_string).collect()
    }

    /// Render the summary shown at the end of a run
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut lines = vec![
            rule.clone(),
            "📊 Batch Publish Summary".to_string(),
            rule.clone(),
        ];

        if !self.succeeded.is_empty() {
            lines.push(String::new());
            lines.push("Successfully published:".to_string());
            for module in &self.succeeded {
                lines.push(format!("   ✅ {}", module));
            }
        }

        if !self.failed.is_empty() {
            lines.push(String::new());
            lines.push("Unable to publish:".to_string());
            for failure in &self.failed {
                lines.push(format!("   ❌ {}", failure));
            }
        }

        if self.total() == 0 {
            lines.push(String::new());
            lines.push("Nothing to publish".to_string());
        }

        lines.push(String::new());
        lines.push(rule.clone());
        lines.push(format!(
            "Overall Status: {} ({} published, {} failed)",
            if self.is_success() { "✅ SUCCESS" } else { "❌ FAILED" },
            self.succeeded.len(),
            self.failed.len()
        ));
        lines.push(rule);

        lines.join("\n")
    }

    /// Print the summary to stdout
    pub fn print_summary(&self) {
        println!("\n{}\n", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(module: &str) -> Outcome {
        Outcome::Success {
            module: module.to_string(),
        }
    }

    fn failure(module: &str, reason: &str) -> Outcome {
        Outcome::Failure {
            module: module.to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_aggregate_scenario() {
        let report = aggregate(&[success("pkg-a"), failure("pkg-b", "403 Forbidden")]);

        assert_eq!(report.succeeded, vec!["pkg-a".to_string()]);
        assert_eq!(report.failure_lines(), vec!["pkg-b (403 Forbidden)".to_string()]);
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_aggregate_preserves_order() {
        let outcomes = vec![
            success("c"),
            failure("x", "e1"),
            success("a"),
            failure("w", "e2"),
            success("b"),
        ];

        let report = aggregate(&outcomes);

        assert_eq!(report.succeeded, vec!["c", "a", "b"]);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.module.as_str()).collect();
        assert_eq!(failed, vec!["x", "w"]);
    }

    #[test]
    fn test_aggregate_partitions_without_loss() {
        let outcomes: Vec<Outcome> = (0..25)
            .map(|i| {
                if i % 3 == 0 {
                    failure(&format!("m{}", i), "boom")
                } else {
                    success(&format!("m{}", i))
                }
            })
            .collect();

        let report = aggregate(&outcomes);

        assert_eq!(report.total(), outcomes.len());
        assert_eq!(report.failed.len(), 9);
        let mut all: Vec<String> = report
            .succeeded
            .iter()
            .cloned()
            .chain(report.failed.iter().map(|f| f.module.clone()))
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), outcomes.len());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let outcomes = vec![success("a"), failure("b", "nope"), success("c")];
        assert_eq!(aggregate(&outcomes), aggregate(&outcomes));
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate(&[]);
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert!(report.render().contains("Nothing to publish"));
    }

    #[test]
    fn test_render() {
        let report = aggregate(&[success("pkg-a"), failure("pkg-b", "403 Forbidden")]);
        let rendered = report.render();

        assert!(rendered.contains("Successfully published:\n   ✅ pkg-a"));
        assert!(rendered.contains("Unable to publish:\n   ❌ pkg-b (403 Forbidden)"));
        assert!(rendered.contains("❌ FAILED (1 published, 1 failed)"));
    }

    #[test]
    fn test_render_success_omits_failure_section() {
        let report = aggregate(&[success("pkg-a")]);
        let rendered = report.render();

        assert!(!rendered.contains("Unable to publish"));
        assert!(rendered.contains("✅ SUCCESS"));
    }

    #[test]
    fn test_report_serialization() {
        let report = aggregate(&[success("pkg-a"), failure("pkg-b", "403 Forbidden")]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["succeeded"], serde_json::json!(["pkg-a"]));
        assert_eq!(json["failed"][0]["reason"], "403 Forbidden");
    }
}
