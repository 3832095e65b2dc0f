//! `PriorityAgent` (§4.5): the `Agent` implementation that ties the impact
//! score, confidence, fix-effort, and history-persistence modules into a
//! single dispatchable `analyze_priority` step.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{PriorityHint, Step, StepResult, StepStatus};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::assignment::{suggest_fix_order, PriorityAssignment};
use crate::confidence::{compute_confidence, compute_fix_effort};
use crate::config::{validate_configuration, TriageConfig};
use crate::history::{resolve_history_path, PriorityHistoryStore};
use crate::impact::{error_severity, test_stability, ImpactContext, InterfaceKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    message: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default = "default_interface")]
    interface: String,
    #[serde(default)]
    priority_hint: Option<PriorityHint>,
    #[serde(default)]
    failure_rate7d: f64,
    #[serde(default = "default_true")]
    any_pass30d: bool,
    #[serde(default)]
    has_scenario_context: bool,
}

fn default_interface() -> String {
    "api".to_string()
}

fn default_true() -> bool {
    true
}

fn parse_interface(value: &str) -> InterfaceKind {
    match value.to_ascii_lowercase().as_str() {
        "ui" => InterfaceKind::Ui,
        "cli" => InterfaceKind::Cli,
        "tui" => InterfaceKind::Tui,
        "mixed" => InterfaceKind::Mixed,
        _ => InterfaceKind::Api,
    }
}

pub struct PriorityAgent {
    state: AgentState,
    config: TriageConfig,
    history: Option<PriorityHistoryStore>,
}

impl PriorityAgent {
    pub fn new(config: TriageConfig) -> Self {
        Self { state: AgentState::Uninitialized, config, history: None }
    }

    fn history(&self) -> Result<&PriorityHistoryStore, AgentError> {
        self.history
            .as_ref()
            .ok_or_else(|| AgentError::initialization("priority history store not loaded"))
    }
}

fn error_result(index: usize, error: AgentError) -> StepResult {
    let status = if matches!(error, AgentError::Cancelled) { StepStatus::Error } else { StepStatus::Failed };
    StepResult {
        step_index: index,
        status,
        duration_ms: 0,
        actual_result: None,
        error: Some(error.step_error_text()),
        screenshot_path: None,
    }
}

#[async_trait(?Send)]
impl Agent for PriorityAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        5_000
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        validate_configuration(&self.config).map_err(|error| AgentError::Config(error.to_string()))?;
        let path = resolve_history_path(&self.config.history_path);
        let history = PriorityHistoryStore::load(path)
            .await
            .map_err(|error| AgentError::initialization(error.to_string()))?;
        self.history = Some(history);
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(path) = environment.get("PRIORITY_HISTORY_PATH") {
            self.config.history_path = path.clone();
        }
    }

    async fn execute_step(&mut self, step: &Step, index: usize, cancellation: &CancellationToken) -> StepResult {
        if cancellation.is_cancelled() {
            return error_result(index, AgentError::Cancelled);
        }
        if step.action != "analyze_priority" {
            return error_result(index, AgentError::unsupported_action(&step.action));
        }

        let scenario_id = step.target.clone();
        if scenario_id.is_empty() {
            return error_result(index, AgentError::action("analyze_priority requires a non-empty target scenario id"));
        }

        let request: AnalyzeRequest = match step.value.clone() {
            Some(value) => match serde_json::from_value(value) {
                Ok(request) => request,
                Err(error) => return error_result(index, AgentError::Validation(error.to_string())),
            },
            None => return error_result(index, AgentError::action("analyze_priority requires a step value payload")),
        };

        let history = match self.history() {
            Ok(history) => history,
            Err(error) => return error_result(index, error),
        };
        let sample_count = history.sample_count(&scenario_id).await;

        let context = ImpactContext {
            message: request.message,
            category: request.category,
            tags: request.tags,
            interface: parse_interface(&request.interface),
            priority_hint: request.priority_hint,
            failure_rate_7d: request.failure_rate7d,
            any_pass_30d: request.any_pass30d,
        };

        let confidence = compute_confidence(sample_count, request.has_scenario_context);
        let severity = error_severity(&context.message);
        let stability = test_stability(context.failure_rate_7d);
        let fix_effort = compute_fix_effort(context.interface, severity, stability);
        let assignment = PriorityAssignment::new(scenario_id, &self.config, &context, confidence, fix_effort);

        if let Err(error) = history.record(assignment.clone()).await {
            return error_result(index, AgentError::action(error.to_string()));
        }

        let actual_result = serde_json::to_value(&assignment).unwrap_or_else(|_| json!({}));
        StepResult {
            step_index: index,
            status: StepStatus::Passed,
            duration_ms: 0,
            actual_result: Some(actual_result),
            error: None,
            screenshot_path: None,
        }
    }

    async fn cleanup(&mut self) {
        self.state = AgentState::Terminated;
    }
}

/// Convenience wrapper used by callers that already hold a batch of
/// assignments and just want a recommended working order (§4.5).
pub fn recommend_fix_order(assignments: Vec<PriorityAssignment>) -> Vec<PriorityAssignment> {
    suggest_fix_order(assignments)
}

#[cfg(test)]
mod tests {
    use attest_core::cancellation::CancellationToken;

    use super::*;

    fn step(target: &str, value: Value) -> Step {
        Step {
            action: "analyze_priority".to_string(),
            target: target.to_string(),
            value: Some(value),
            expected: None,
            timeout_ms: None,
            description: String::new(),
            continue_on_failure: false,
        }
    }

    #[tokio::test]
    async fn functional_analyze_priority_produces_passed_step_with_assignment_payload() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let mut config = TriageConfig::default();
        config.history_path = tempdir.path().join("history.json").to_string_lossy().to_string();
        let mut agent = PriorityAgent::new(config);
        agent.initialize().await.expect("initialize");

        let value = json!({
            "message": "fatal crash in renderer",
            "interface": "ui",
            "priorityHint": "CRITICAL",
            "anyPass30d": false,
        });
        let result = agent.execute_step(&step("scenario-a", value), 0, &CancellationToken::new()).await;
        assert_eq!(result.status, StepStatus::Passed);
        let payload = result.actual_result.expect("payload");
        assert_eq!(payload["scenarioId"], "scenario-a");
        assert!(payload["impactScore"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn regression_unsupported_action_fails_with_action_error_text() {
        let mut agent = PriorityAgent::new(TriageConfig::default());
        let mut bad_step = step("scenario-a", json!({}));
        bad_step.action = "teleport".to_string();
        let result = agent.execute_step(&bad_step, 0, &CancellationToken::new()).await;
        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.error.unwrap().contains("ActionError"));
    }

    #[tokio::test]
    async fn regression_missing_history_store_before_initialize_fails() {
        let mut agent = PriorityAgent::new(TriageConfig::default());
        let value = json!({"message": "boom"});
        let result = agent.execute_step(&step("scenario-a", value), 0, &CancellationToken::new()).await;
        assert_eq!(result.status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn regression_initialize_rejects_skewed_weights_instead_of_scoring_silently() {
        let mut config = TriageConfig::default();
        config.weights.error_severity = 0.9;
        let mut agent = PriorityAgent::new(config);
        let error = agent.initialize().await.expect_err("skewed weights should fail validation");
        assert!(matches!(error, AgentError::Config(_)));
    }
}
