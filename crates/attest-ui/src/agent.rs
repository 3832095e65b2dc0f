//! The `UI` agent variant (§4.1): dispatches scenario steps through the
//! deterministic fixture responder in [`crate::contract`] instead of a live
//! browser backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};
use serde_json::Value;

use crate::contract::{
    evaluate_ui_case, UiCaseExpectation, UiContractCase, UiOutcomeKind, UiReplayStep,
    UI_ERROR_BACKEND_UNAVAILABLE, UI_ERROR_TIMEOUT,
};

pub struct UiAgent {
    state: AgentState,
    base_url: Option<String>,
}

impl UiAgent {
    pub fn new() -> Self {
        Self {
            state: AgentState::Uninitialized,
            base_url: None,
        }
    }

    fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), target),
            None => target.to_string(),
        }
    }

    fn value_as_text(value: &Option<Value>) -> String {
        match value {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn placeholder_expectation() -> UiCaseExpectation {
        UiCaseExpectation {
            outcome: UiOutcomeKind::Success,
            status_code: 200,
            error_code: String::new(),
            response_body: Value::Null,
        }
    }

    fn build_case(&self, step: &Step, index: usize, default_timeout_ms: u64) -> UiContractCase {
        let operation = step.action.trim().to_ascii_lowercase();
        let url = if operation == "navigate" {
            self.resolve_url(&step.target)
        } else {
            String::new()
        };
        let selector = if operation == "navigate" || operation == "wait" || operation == "snapshot" {
            String::new()
        } else {
            step.target.clone()
        };
        let text = if operation == "type" {
            Self::value_as_text(&step.value)
        } else {
            String::new()
        };
        UiContractCase {
            schema_version: crate::contract::UI_CONTRACT_SCHEMA_VERSION,
            case_id: format!("step-{index}"),
            operation,
            url,
            selector,
            text,
            timeout_ms: step.timeout_ms.unwrap_or(default_timeout_ms).max(1),
            simulate_retryable_failure: false,
            simulate_timeout: false,
            expected: Self::placeholder_expectation(),
        }
    }

    fn step_result(index: usize, result: Result<serde_json::Value, AgentError>) -> StepResult {
        match result {
            Ok(value) => StepResult {
                step_index: index,
                status: StepStatus::Passed,
                duration_ms: 0,
                actual_result: Some(value),
                error: None,
                screenshot_path: None,
            },
            Err(error) => {
                let status = if matches!(error, AgentError::Cancelled) {
                    StepStatus::Error
                } else {
                    StepStatus::Failed
                };
                StepResult {
                    step_index: index,
                    status,
                    duration_ms: 0,
                    actual_result: None,
                    error: Some(error.step_error_text()),
                    screenshot_path: None,
                }
            }
        }
    }
}

impl Default for UiAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Agent for UiAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        5_000
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(base_url) = environment.get("UI_BASE_URL") {
            self.base_url = Some(base_url.clone());
        }
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        self.state = AgentState::Running;
        if cancellation.is_cancelled() {
            self.state = AgentState::Ready;
            return Self::step_result(index, Err(AgentError::Cancelled));
        }

        let case = self.build_case(step, index, self.default_timeout_ms());
        let outcome = evaluate_ui_case(&case);
        self.state = AgentState::Ready;

        let result = match outcome.step {
            UiReplayStep::Success => Ok(outcome.response_body),
            UiReplayStep::MalformedInput => Err(AgentError::action(format!(
                "{}: {}",
                outcome.error_code.unwrap_or_default(),
                outcome.response_body
            ))),
            UiReplayStep::RetryableFailure => {
                let code = outcome.error_code.unwrap_or_default();
                if code == UI_ERROR_TIMEOUT {
                    Err(AgentError::timeout(format!("{code}: {}", outcome.response_body)))
                } else {
                    let _ = UI_ERROR_BACKEND_UNAVAILABLE;
                    Err(AgentError::transport(format!("{code}: {}", outcome.response_body)))
                }
            }
        };
        Self::step_result(index, result)
    }

    async fn cleanup(&mut self) {
        self.state = AgentState::Terminated;
    }
}
