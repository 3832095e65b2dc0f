//! Automatic post-failure forwarding (§2: "Failures are forwarded to the
//! Triage Pipeline (E); failures above a configured threshold are forwarded
//! to the Issue Reporter (F)").
//!
//! Every scenario result that finishes `Failed` or `Error` is scored by the
//! triage pipeline and appended to its priority history; scores at or above
//! `issue_priority_threshold` are additionally submitted through the issue
//! reporter. Neither path ever fails the run: a broken history store
//! disables forwarding for the session, and issue submission keeps its own
//! fail-safe behaviour.

use std::path::PathBuf;

use attest_core::model::{AgentType, Priority, Scenario, TestFailure, TestResult, TestStatus};
use attest_issues::{FailureReport, IssueReporter, IssueTrackerClient};
use attest_triage::{
    compute_confidence, compute_fix_effort, compute_impact_factors, resolve_history_path, validate_configuration,
    ImpactContext, InterfaceKind, PriorityAssignment, PriorityHistoryStore, TriageConfig,
};

use crate::config::OrchestratorConfig;
use crate::registry::primary_role;

pub struct TriagePipeline {
    triage_config: TriageConfig,
    history: PriorityHistoryStore,
    issue_reporter: Option<IssueReporter>,
    issue_priority_threshold: Priority,
}

impl TriagePipeline {
    /// Loads the priority history store and, if an issue tracker is
    /// configured, builds its reporter. Returns `None` (disabling
    /// forwarding for this run) when the history store can't be loaded,
    /// rather than failing the whole session over a stale or corrupt file.
    pub async fn load(config: &OrchestratorConfig) -> Option<Self> {
        if let Err(error) = validate_configuration(&config.triage) {
            tracing::warn!(%error, "triage configuration is invalid, automatic forwarding disabled for this run");
            return None;
        }

        let path = resolve_history_path(&config.triage.history_path);
        let history = match PriorityHistoryStore::load(path).await {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(%error, "priority history failed to load, automatic forwarding disabled for this run");
                return None;
            }
        };

        let issue_reporter = config.issue_reporter.as_ref().map(|issue_config| {
            let token = std::env::var(&issue_config.access_token_env).unwrap_or_default();
            let client = IssueTrackerClient::new(issue_config.base_url.clone(), token);
            IssueReporter::new(client, issue_config.clone())
        });

        Some(Self {
            triage_config: config.triage.clone(),
            history,
            issue_reporter,
            issue_priority_threshold: config.issue_priority_threshold,
        })
    }

    /// Scores and records `result` if it failed, then forwards to the issue
    /// reporter when the assigned priority meets the configured threshold.
    /// A no-op for passed/skipped results.
    pub async fn forward(&self, scenario: &Scenario, result: &TestResult) -> Option<PriorityAssignment> {
        if !matches!(result.status, TestStatus::Failed | TestStatus::Error) {
            return None;
        }
        let failure = result.failures.first()?;

        let context = build_context(scenario, failure);
        let sample_count = self.history.sample_count(&scenario.id).await;
        let confidence = compute_confidence(sample_count, true);
        let factors = compute_impact_factors(&context);
        let fix_effort = compute_fix_effort(context.interface, factors.error_severity, factors.test_stability);
        let assignment = PriorityAssignment::new(scenario.id.clone(), &self.triage_config, &context, confidence, fix_effort);

        if let Err(error) = self.history.record(assignment.clone()).await {
            tracing::warn!(scenario_id = %scenario.id, %error, "failed to persist priority assignment");
        }

        if assignment.priority.rank() <= self.issue_priority_threshold.rank() {
            if let Some(reporter) = &self.issue_reporter {
                let report = FailureReport {
                    scenario_id: scenario.id.clone(),
                    error_message: failure.message.clone(),
                    category: failure.category.clone(),
                    stack_trace: failure.stack_trace.clone(),
                    tags: scenario.tags.iter().cloned().collect(),
                    screenshot_path: failure.screenshots.first().map(PathBuf::from),
                };
                reporter.submit_failure(&report, chrono::Utc::now().timestamp()).await;
            }
        }

        Some(assignment)
    }
}

fn interface_kind(agent_type: Option<AgentType>) -> InterfaceKind {
    match agent_type {
        Some(AgentType::Api) => InterfaceKind::Api,
        Some(AgentType::Cli) => InterfaceKind::Cli,
        Some(AgentType::Tui) => InterfaceKind::Tui,
        Some(AgentType::Ui) => InterfaceKind::Ui,
        _ => InterfaceKind::Mixed,
    }
}

fn build_context(scenario: &Scenario, failure: &TestFailure) -> ImpactContext {
    let agent_type = primary_role(scenario).map(|role| role.agent_type);
    ImpactContext {
        message: failure.message.clone(),
        category: failure.category.clone(),
        tags: scenario.tags.clone(),
        interface: interface_kind(agent_type),
        priority_hint: scenario.priority_hint,
        failure_rate_7d: 0.0,
        any_pass_30d: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use attest_core::model::{AgentRoleConfig, Step};

    use super::*;

    fn scenario(id: &str, agent_type: AgentType) -> Scenario {
        let mut agents = BTreeMap::new();
        agents.insert("primary".to_string(), AgentRoleConfig { agent_type, config: serde_json::json!({}) });
        Scenario {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            prerequisites: Vec::new(),
            agents,
            steps: vec![Step {
                action: "noop".to_string(),
                target: String::new(),
                value: None,
                expected: None,
                timeout_ms: None,
                description: String::new(),
                continue_on_failure: false,
            }],
            verifications: Vec::new(),
            cleanup: Vec::new(),
            environment: BTreeMap::new(),
            timeout_ms: None,
            retries: None,
            priority_hint: Some(attest_core::model::PriorityHint::Critical),
            tags: Default::default(),
            enabled: true,
            continue_on_failure: false,
        }
    }

    fn failed_result(scenario_id: &str, message: &str) -> TestResult {
        TestResult {
            scenario_id: scenario_id.to_string(),
            status: TestStatus::Failed,
            start_time: 0,
            end_time: 0,
            duration_ms: 0,
            step_results: Vec::new(),
            failures: vec![TestFailure {
                scenario_id: scenario_id.to_string(),
                timestamp: 0,
                message: message.to_string(),
                category: Some("ui".to_string()),
                failed_step: None,
                stack_trace: None,
                logs: Vec::new(),
                screenshots: Vec::new(),
                is_known_issue: None,
            }],
            screenshots: Vec::new(),
            retries: 0,
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn functional_load_with_empty_history_path_builds_a_working_pipeline() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let mut config = OrchestratorConfig::default();
        config.triage.history_path = tempdir.path().join("history.json").to_string_lossy().to_string();
        let pipeline = TriagePipeline::load(&config).await.expect("pipeline should load");

        let scenario = scenario("s1", AgentType::Ui);
        let result = failed_result("s1", "fatal crash in renderer");
        let assignment = pipeline.forward(&scenario, &result).await.expect("failure should be scored");
        assert_eq!(assignment.scenario_id, "s1");
        assert!(assignment.impact_score > 0.0);
    }

    #[tokio::test]
    async fn unit_passed_result_is_never_forwarded() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let mut config = OrchestratorConfig::default();
        config.triage.history_path = tempdir.path().join("history.json").to_string_lossy().to_string();
        let pipeline = TriagePipeline::load(&config).await.expect("pipeline should load");

        let scenario = scenario("s1", AgentType::Ui);
        let mut result = failed_result("s1", "fatal crash in renderer");
        result.status = TestStatus::Passed;
        assert!(pipeline.forward(&scenario, &result).await.is_none());
    }

    #[tokio::test]
    async fn regression_invalid_triage_weights_disable_forwarding_instead_of_scoring_silently() {
        let mut config = OrchestratorConfig::default();
        config.triage.weights.error_severity = 0.9;
        assert!(TriagePipeline::load(&config).await.is_none());
    }
}
