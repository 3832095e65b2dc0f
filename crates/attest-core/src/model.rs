//! In-memory scenario schema shared by every agent and the orchestrator.
//!
//! Loading scenarios from YAML is out of scope; this module only defines the
//! schema the loader is expected to produce.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityHint {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// §3 invariant: `impactScore` determines `priority` by these thresholds.
    pub fn from_impact_score(impact_score: f64) -> Self {
        if impact_score >= 80.0 {
            Self::Critical
        } else if impact_score >= 60.0 {
            Self::High
        } else if impact_score >= 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Ascending severity rank used to sort `CRITICAL → LOW`.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOperator {
    Equals,
    Contains,
    Matches,
    GreaterThan,
    LessThan,
    Exists,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    #[serde(rename = "type")]
    pub verification_type: String,
    pub target: String,
    pub expected: serde_json::Value,
    pub operator: VerificationOperator,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub action: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub expected: Option<serde_json::Value>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub description: String,
    /// §9 open-question resolution: step-level `continueOnFailure` is an
    /// explicit opt-in, defaulting to `false`.
    #[serde(default = "default_false")]
    pub continue_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRoleConfig {
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentType {
    Api,
    Cli,
    Tui,
    Ui,
    System,
    Issue,
    Priority,
    Comprehension,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Cli => "CLI",
            Self::Tui => "TUI",
            Self::Ui => "UI",
            Self::System => "SYSTEM",
            Self::Issue => "ISSUE",
            Self::Priority => "PRIORITY",
            Self::Comprehension => "COMPREHENSION",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentRoleConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub verifications: Vec<Verification>,
    #[serde(default)]
    pub cleanup: Vec<Step>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub priority_hint: Option<PriorityHint>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// §9 open-question resolution: scenario-level `continueOnFailure`,
    /// default `false` (a single failed step aborts the remaining steps).
    #[serde(default = "default_false")]
    pub continue_on_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Passed,
    Failed,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub actual_result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub screenshot_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFailure {
    pub scenario_id: String,
    pub timestamp: i64,
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub failed_step: Option<usize>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub is_known_issue: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub scenario_id: String,
    pub status: TestStatus,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_ms: u64,
    pub step_results: Vec<StepResult>,
    pub failures: Vec<TestFailure>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TestResult {
    /// §8 universal invariant: `durationMs == (endTime - startTime)`.
    pub fn assert_duration_consistent(&self) -> bool {
        let expected = self.end_time.saturating_sub(self.start_time).max(0) as u64;
        expected == self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, TestResult, TestStatus};

    #[test]
    fn unit_priority_from_impact_score_respects_thresholds_exactly() {
        assert_eq!(Priority::from_impact_score(80.0), Priority::Critical);
        assert_eq!(Priority::from_impact_score(79.999), Priority::High);
        assert_eq!(Priority::from_impact_score(60.0), Priority::High);
        assert_eq!(Priority::from_impact_score(59.999), Priority::Medium);
        assert_eq!(Priority::from_impact_score(40.0), Priority::Medium);
        assert_eq!(Priority::from_impact_score(39.999), Priority::Low);
        assert_eq!(Priority::from_impact_score(0.0), Priority::Low);
    }

    #[test]
    fn unit_priority_rank_orders_critical_first() {
        let mut priorities = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        priorities.sort_by_key(|priority| priority.rank());
        assert_eq!(
            priorities,
            vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]
        );
    }

    #[test]
    fn regression_test_result_duration_invariant_detects_mismatch() {
        let result = TestResult {
            scenario_id: "s1".to_string(),
            status: TestStatus::Passed,
            start_time: 1_000,
            end_time: 1_500,
            duration_ms: 400,
            step_results: vec![],
            failures: vec![],
            screenshots: vec![],
            retries: 0,
            metadata: Default::default(),
        };
        assert!(!result.assert_duration_consistent());
    }
}
