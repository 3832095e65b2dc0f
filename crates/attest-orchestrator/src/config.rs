//! Bundled orchestrator-run configuration (§2, §4.4–§4.6): execution
//! settings plus the triage-pipeline and issue-reporter configuration
//! needed to wire automatic post-failure forwarding into a run.

use attest_core::config::ExecutionConfig;
use attest_core::model::Priority;
use attest_issues::IssueReporterConfig;
use attest_triage::TriageConfig;
use serde::{Deserialize, Serialize};

fn default_issue_priority_threshold() -> Priority {
    Priority::High
}

/// §2: "failures above a configured threshold are forwarded to the Issue
/// Reporter". `issue_reporter` is `None` when no issue tracker is
/// configured, in which case every failure is still scored and recorded by
/// the triage pipeline but nothing is ever submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub triage: TriageConfig,
    #[serde(default)]
    pub issue_reporter: Option<IssueReporterConfig>,
    #[serde(default = "default_issue_priority_threshold")]
    pub issue_priority_threshold: Priority,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            triage: TriageConfig::default(),
            issue_reporter: None,
            issue_priority_threshold: default_issue_priority_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrchestratorConfig;
    use attest_core::model::Priority;

    #[test]
    fn unit_default_config_thresholds_at_high_with_no_issue_reporter() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.issue_priority_threshold, Priority::High);
        assert!(config.issue_reporter.is_none());
    }

    #[test]
    fn functional_partial_json_fills_in_defaults() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"execution":{"maxParallel":2}}"#).expect("should deserialize");
        assert_eq!(config.execution.max_parallel, 2);
        assert_eq!(config.triage.flaky_threshold, 0.3);
    }
}
