//! `IssueAgent` (§4.6): the `Agent` implementation wrapping `IssueReporter`
//! behind a single `submit_issue` dispatchable step.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};
use serde::Deserialize;
use serde_json::json;

use crate::client::IssueTrackerClient;
use crate::config::IssueReporterConfig;
use crate::reporter::{FailureReport, IssueReporter, SubmissionOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitIssueRequest {
    error_message: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    stack_trace: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    screenshot_path: Option<PathBuf>,
}

pub struct IssueAgent {
    state: AgentState,
    config: IssueReporterConfig,
    reporter: Option<IssueReporter>,
}

impl IssueAgent {
    pub fn new(config: IssueReporterConfig) -> Self {
        Self { state: AgentState::Uninitialized, config, reporter: None }
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
impl Agent for IssueAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        15_000
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        if self.config.repository.is_empty() || self.config.base_url.is_empty() {
            return Err(AgentError::initialization("issue reporter requires repository and baseUrl to be configured"));
        }
        let token = std::env::var(&self.config.access_token_env).unwrap_or_default();
        let client = IssueTrackerClient::new(self.config.base_url.clone(), token);
        self.reporter = Some(IssueReporter::new(client, self.config.clone()));
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(repository) = environment.get("ISSUE_REPOSITORY") {
            self.config.repository = repository.clone();
        }
    }

    async fn execute_step(&mut self, step: &Step, index: usize, cancellation: &CancellationToken) -> StepResult {
        if cancellation.is_cancelled() {
            return error_result(index, AgentError::Cancelled);
        }
        if step.action != "submit_issue" {
            return error_result(index, AgentError::unsupported_action(&step.action));
        }

        let scenario_id = step.target.clone();
        if scenario_id.is_empty() {
            return error_result(index, AgentError::action("submit_issue requires a non-empty target scenario id"));
        }

        let request: SubmitIssueRequest = match step.value.clone() {
            Some(value) => match serde_json::from_value(value) {
                Ok(request) => request,
                Err(error) => return error_result(index, AgentError::Validation(error.to_string())),
            },
            None => return error_result(index, AgentError::action("submit_issue requires a step value payload")),
        };

        let Some(reporter) = &self.reporter else {
            return error_result(index, AgentError::initialization("issue reporter not initialized"));
        };

        let report = FailureReport {
            scenario_id,
            error_message: request.error_message,
            category: request.category,
            stack_trace: request.stack_trace,
            tags: request.tags,
            screenshot_path: request.screenshot_path,
        };
        let now_epoch = chrono::Utc::now().timestamp();
        let outcome = reporter.submit_failure(&report, now_epoch).await;

        let actual_result = match &outcome {
            SubmissionOutcome::Created { number, url } => json!({"outcome": "created", "number": number, "url": url}),
            SubmissionOutcome::Duplicate { number, url } => json!({"outcome": "duplicate", "number": number, "url": url}),
            SubmissionOutcome::Skipped { reason } => json!({"outcome": "skipped", "reason": reason}),
        };

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
