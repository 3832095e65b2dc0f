//! The `COMPREHENSION` agent variant (§4.1, §6 "LLM contract"): issues a
//! single chat-completion call per step and extracts the first JSON object
//! from the text payload.

use std::collections::BTreeMap;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};
use serde_json::Value;

use crate::client::ChatCompletionClient;
use crate::extract::extract_first_json_object;
use crate::types::ChatRequest;

pub struct ComprehensionAgent {
    state: AgentState,
    client: Box<dyn ChatCompletionClient>,
    default_system: String,
}

impl ComprehensionAgent {
    pub fn new(client: Box<dyn ChatCompletionClient>) -> Self {
        Self {
            state: AgentState::Uninitialized,
            client,
            default_system: String::new(),
        }
    }

    fn overrides_from_value(value: &Option<Value>) -> (Option<String>, Option<f32>, Option<u32>) {
        let Some(Value::Object(object)) = value else {
            return (None, None, None);
        };
        let system = object.get("system").and_then(Value::as_str).map(str::to_string);
        let temperature = object.get("temperature").and_then(Value::as_f64).map(|v| v as f32);
        let max_tokens = object.get("maxTokens").and_then(Value::as_u64).map(|v| v as u32);
        (system, temperature, max_tokens)
    }

    fn error_result(index: usize, error: AgentError) -> StepResult {
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

#[async_trait(?Send)]
impl Agent for ComprehensionAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        30_000
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(system) = environment.get("LLM_SYSTEM_PROMPT") {
            self.default_system = system.clone();
        }
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        self.state = AgentState::Running;

        if step.action != "analyze" {
            self.state = AgentState::Ready;
            return Self::error_result(index, AgentError::unsupported_action(&step.action));
        }
        if cancellation.is_cancelled() {
            self.state = AgentState::Ready;
            return Self::error_result(index, AgentError::Cancelled);
        }

        let (system_override, temperature, max_tokens) = Self::overrides_from_value(&step.value);
        let mut request = ChatRequest::new(
            system_override.unwrap_or_else(|| self.default_system.clone()),
            step.target.clone(),
        );
        if let Some(temperature) = temperature {
            request.temperature = temperature;
        }
        if let Some(max_tokens) = max_tokens {
            request.max_tokens = max_tokens;
        }

        let result = match self.client.complete(&request).await {
            Ok(response) => extract_first_json_object(&response.text),
            Err(error) => Err(error),
        };
        self.state = AgentState::Ready;

        match result {
            Ok(value) => StepResult {
                step_index: index,
                status: StepStatus::Passed,
                duration_ms: 0,
                actual_result: Some(value),
                error: None,
                screenshot_path: None,
            },
            Err(error) => Self::error_result(index, error),
        }
    }

    async fn cleanup(&mut self) {
        self.state = AgentState::Terminated;
    }
}
