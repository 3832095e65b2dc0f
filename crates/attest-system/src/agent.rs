//! The `SYSTEM` agent variant (§4.1): runs ambient health checks
//! (`check_process | check_port | check_disk_space | check_memory | wait`)
//! as scenario steps.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};
use serde_json::{json, Value};

use crate::checks::{check_disk_space, check_memory, check_port, check_process, CheckStatus, SystemCheckResult};
use crate::config::SystemAgentConfig;

pub struct SystemAgent {
    state: AgentState,
    config: SystemAgentConfig,
}

impl SystemAgent {
    pub fn new(config: SystemAgentConfig) -> Self {
        Self {
            state: AgentState::Uninitialized,
            config,
        }
    }

    fn expected_bool(step: &Step, default: bool) -> bool {
        match &step.expected {
            Some(Value::Bool(value)) => *value,
            _ => default,
        }
    }

    fn value_as_u64(step: &Step, default: u64) -> u64 {
        match &step.value {
            Some(Value::Number(number)) => number.as_u64().unwrap_or(default),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    fn parse_host_port(&self, target: &str) -> (String, Option<u16>) {
        match target.rsplit_once(':') {
            Some((host, port)) => (
                if host.is_empty() { self.config.default_host.clone() } else { host.to_string() },
                port.trim().parse().ok(),
            ),
            None => (self.config.default_host.clone(), target.trim().parse().ok()),
        }
    }

    fn result_to_step_result(index: usize, result: SystemCheckResult) -> StepResult {
        let body = json!({
            "key": result.key,
            "code": result.code,
            "detail": result.detail,
        });
        match result.status {
            CheckStatus::Pass => StepResult {
                step_index: index,
                status: StepStatus::Passed,
                duration_ms: 0,
                actual_result: Some(body),
                error: None,
                screenshot_path: None,
            },
            CheckStatus::Warn => StepResult {
                step_index: index,
                status: StepStatus::Passed,
                duration_ms: 0,
                actual_result: Some(body),
                error: None,
                screenshot_path: None,
            },
            CheckStatus::Fail => StepResult {
                step_index: index,
                status: StepStatus::Failed,
                duration_ms: 0,
                actual_result: Some(body.clone()),
                error: Some(AgentError::action(body.to_string()).step_error_text()),
                screenshot_path: None,
            },
        }
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

    fn dispatch(&self, step: &Step) -> Result<SystemCheckResult, AgentError> {
        match step.action.as_str() {
            "check_process" => Ok(check_process(&step.target, Self::expected_bool(step, true))),
            "check_port" => {
                let (host, port) = self.parse_host_port(&step.target);
                let port = port.ok_or_else(|| AgentError::action(format!("invalid port in target '{}'", step.target)))?;
                let timeout_ms = Self::value_as_u64(step, self.config.port_connect_timeout_ms);
                Ok(check_port(&host, port, timeout_ms, Self::expected_bool(step, true)))
            }
            "check_disk_space" => {
                let path = if step.target.trim().is_empty() { "/".to_string() } else { step.target.clone() };
                let min_bytes = Self::value_as_u64(step, 0);
                Ok(check_disk_space(Path::new(&path), min_bytes))
            }
            "check_memory" => {
                let min_bytes = Self::value_as_u64(step, 0);
                Ok(check_memory(min_bytes))
            }
            other => Err(AgentError::unsupported_action(other)),
        }
    }
}

#[async_trait(?Send)]
impl Agent for SystemAgent {
    fn state(&self) -> AgentState {
        self.state
    }

    fn default_timeout_ms(&self) -> u64 {
        self.config.default_timeout_ms
    }

    async fn initialize(&mut self) -> Result<(), AgentError> {
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        if let Some(host) = environment.get("SYSTEM_DEFAULT_HOST") {
            self.config.default_host = host.clone();
        }
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        self.state = AgentState::Running;

        if step.action == "wait" {
            let duration_ms = Self::value_as_u64(step, self.config.default_timeout_ms);
            let outcome = tokio::select! {
                _ = cancellation.cancelled() => Err(AgentError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => Ok(()),
            };
            self.state = AgentState::Ready;
            return match outcome {
                Ok(()) => StepResult {
                    step_index: index,
                    status: StepStatus::Passed,
                    duration_ms: 0,
                    actual_result: Some(json!({"waited_ms": duration_ms})),
                    error: None,
                    screenshot_path: None,
                },
                Err(error) => Self::error_result(index, error),
            };
        }

        let result = self.dispatch(step);
        self.state = AgentState::Ready;
        match result {
            Ok(check_result) => Self::result_to_step_result(index, check_result),
            Err(error) => Self::error_result(index, error),
        }
    }

    async fn cleanup(&mut self) {
        self.state = AgentState::Terminated;
    }
}
