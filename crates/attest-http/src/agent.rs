//! The HTTP/API agent: the step-action dispatch table for the most
//! behaviourally complete agent (§4.1, §4.2).

use std::collections::BTreeMap;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};

use crate::auth::parse_set_auth;
use crate::client::{HttpClient, HttpMethod};
use crate::config::HttpAgentConfig;
use crate::validation::{validate_headers, validate_response, validate_schema, validate_status};

const DEFAULT_STEP_TIMEOUT_MS: u64 = 10_000;

pub struct ApiAgent {
    state: AgentState,
    client: HttpClient,
}

impl ApiAgent {
    pub fn new(config: HttpAgentConfig) -> Self {
        Self {
            state: AgentState::Uninitialized,
            client: HttpClient::new(config),
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    fn step_value_as_str(step: &Step) -> Option<String> {
        match &step.value {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }

    fn expected_as_str(step: &Step) -> Option<String> {
        match &step.expected {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }

    fn ok_result(index: usize, actual: Option<serde_json::Value>) -> StepResult {
        StepResult {
            step_index: index,
            status: StepStatus::Passed,
            duration_ms: 0,
            actual_result: actual,
            error: None,
            screenshot_path: None,
        }
    }

    fn fail_result(index: usize, error: AgentError) -> StepResult {
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

    fn validation_result(index: usize, outcome: Result<bool, AgentError>) -> StepResult {
        match outcome {
            Ok(true) => Self::ok_result(index, Some(serde_json::Value::Bool(true))),
            Ok(false) => StepResult {
                step_index: index,
                status: StepStatus::Failed,
                duration_ms: 0,
                actual_result: Some(serde_json::Value::Bool(false)),
                error: Some(AgentError::Validation("expectation not met".to_string()).step_error_text()),
                screenshot_path: None,
            },
            Err(error) => Self::fail_result(index, error),
        }
    }
}

#[async_trait(?Send)]
impl Agent for ApiAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        DEFAULT_STEP_TIMEOUT_MS
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        if self.state != AgentState::Uninitialized {
            return Err(AgentError::Initialization(
                "initialize() requires Uninitialized state".to_string(),
            ));
        }
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(base_url) = environment.get("API_BASE_URL") {
            self.client.config_mut().base_url = base_url.clone();
        }
        if let Some(timeout) = environment.get("API_TIMEOUT").and_then(|value| value.parse().ok()) {
            self.client.config_mut().timeout_ms = timeout;
        }
        if let Some(token) = environment.get("API_AUTH_TOKEN") {
            self.client.config_mut().auth = Some(crate::config::AuthConfig::Bearer {
                token: token.clone(),
            });
        }
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        self.state = AgentState::Running;
        let result = self.dispatch(step, index, cancellation).await;
        self.state = AgentState::Ready;
        result
    }

    async fn cleanup(&mut self) {
        self.client.reset();
        self.state = AgentState::Terminated;
    }
}

impl ApiAgent {
    async fn dispatch(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        let action = step.action.to_ascii_lowercase();
        if let Some(method) = HttpMethod::parse(&action) {
            let body = step.value.clone();
            return match self.client.send(method, &step.target, body, cancellation).await {
                Ok(response) => Self::ok_result(index, Some(response.data)),
                Err(error) => Self::fail_result(index, error),
            };
        }

        match action.as_str() {
            "validate_status" => {
                let expected = Self::expected_as_str(step)
                    .and_then(|value| value.parse::<u16>().ok())
                    .unwrap_or(0);
                let outcome = validate_status(self.client.last_response().as_ref(), expected);
                Self::validation_result(index, outcome)
            }
            "validate_headers" => {
                let expected: BTreeMap<String, String> = step
                    .expected
                    .as_ref()
                    .and_then(|value| serde_json::from_value(value.clone()).ok())
                    .unwrap_or_default();
                let outcome = validate_headers(self.client.last_response().as_ref(), &expected);
                Self::validation_result(index, outcome)
            }
            "validate_response" => {
                let expected = Self::expected_as_str(step).unwrap_or_default();
                let outcome = validate_response(self.client.last_response().as_ref(), &expected);
                Self::validation_result(index, outcome)
            }
            "validate_schema" => {
                let schema = Self::expected_as_str(step).unwrap_or_default();
                let enabled = self.client.config().validation.enabled;
                let outcome = validate_schema(self.client.last_response().as_ref(), enabled, &schema);
                Self::validation_result(index, outcome)
            }
            "set_header" => {
                if let Some(value) = Self::step_value_as_str(step) {
                    self.client.set_header(step.target.clone(), value);
                    Self::ok_result(index, None)
                } else {
                    Self::fail_result(index, AgentError::action("set_header requires a value"))
                }
            }
            "set_auth" => {
                let value = Self::step_value_as_str(step).unwrap_or_default();
                match parse_set_auth(&step.target, &value) {
                    Some(auth) => {
                        self.client.config_mut().auth = Some(auth);
                        Self::ok_result(index, None)
                    }
                    None => Self::fail_result(
                        index,
                        AgentError::action(format!("unsupported auth type '{}'", step.target)),
                    ),
                }
            }
            "wait" => {
                let millis = Self::step_value_as_str(step)
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(0);
                tokio::select! {
                    _ = cancellation.cancelled() => Self::fail_result(index, AgentError::Cancelled),
                    _ = tokio::time::sleep(std::time::Duration::from_millis(millis)) => Self::ok_result(index, None),
                }
            }
            "clear_cookies" => {
                self.client.set_header("Cookie".to_string(), String::new());
                Self::ok_result(index, None)
            }
            other => Self::fail_result(index, AgentError::unsupported_action(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use attest_core::agent::{Agent, AgentState};
    use attest_core::cancellation::CancellationToken;
    use attest_core::model::{Step, StepStatus};

    use super::ApiAgent;
    use crate::config::HttpAgentConfig;

    fn step(action: &str, target: &str, value: Option<serde_json::Value>, expected: Option<serde_json::Value>) -> Step {
        Step {
            action: action.to_string(),
            target: target.to_string(),
            value,
            expected,
            timeout_ms: None,
            description: String::new(),
            continue_on_failure: false,
        }
    }

    #[tokio::test]
    async fn unit_unsupported_action_fails_with_action_error_text() {
        let mut agent = ApiAgent::new(HttpAgentConfig::default());
        agent.initialize().await.expect("should initialize");
        let cancellation = CancellationToken::new();
        let result = agent
            .execute_step(&step("levitate", "", None, None), 0, &cancellation)
            .await;
        assert_eq!(result.status, StepStatus::Failed);
        let error = result.error.expect("error text");
        assert!(error.contains("Unsupported"));
        assert!(error.contains("ActionError"));
    }

    #[tokio::test]
    async fn functional_apply_environment_maps_base_url_timeout_and_token() {
        let mut agent = ApiAgent::new(HttpAgentConfig::default());
        let mut environment = BTreeMap::new();
        environment.insert("API_BASE_URL".to_string(), "https://api.test".to_string());
        environment.insert("API_TIMEOUT".to_string(), "5000".to_string());
        environment.insert("API_AUTH_TOKEN".to_string(), "tok".to_string());
        agent.apply_environment(&environment);
        assert_eq!(agent.client().config().base_url, "https://api.test");
        assert_eq!(agent.client().config().timeout_ms, 5000);
        assert!(matches!(
            agent.client().config().auth,
            Some(crate::config::AuthConfig::Bearer { .. })
        ));
    }

    #[tokio::test]
    async fn regression_execute_before_initialize_is_caller_responsibility_state_tracked() {
        let agent = ApiAgent::new(HttpAgentConfig::default());
        assert_eq!(agent.state(), AgentState::Uninitialized);
    }

    #[tokio::test]
    async fn unit_validate_status_without_prior_request_fails_with_no_response() {
        let mut agent = ApiAgent::new(HttpAgentConfig::default());
        agent.initialize().await.expect("should initialize");
        let cancellation = CancellationToken::new();
        let result = agent
            .execute_step(
                &step("validate_status", "", None, Some(serde_json::json!(200))),
                0,
                &cancellation,
            )
            .await;
        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.error.unwrap().contains("NoResponseError"));
    }
}
