//! The CLI/TUI session agent: spawns and drives a child process through the
//! step-action dispatch table (§4.3).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use attest_core::agent::{Agent, AgentState};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Step, StepResult, StepStatus};
use tokio::sync::Mutex;

use crate::config::SessionAgentConfig;
use crate::process::SessionProcess;
use crate::registry::ProcessRegistry;
use crate::validation::validate_output;

const DEFAULT_STEP_TIMEOUT_MS: u64 = 10_000;

pub struct SessionAgent {
    state: AgentState,
    config: SessionAgentConfig,
    pending_env: BTreeMap<String, String>,
    process: Option<Arc<Mutex<SessionProcess>>>,
}

impl SessionAgent {
    pub fn new(config: SessionAgentConfig) -> Self {
        Self {
            state: AgentState::Uninitialized,
            config,
            pending_env: BTreeMap::new(),
            process: None,
        }
    }

    fn value_as_str(step: &Step) -> Option<String> {
        match &step.value {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }

    fn value_as_args(step: &Step) -> Option<Vec<String>> {
        match &step.value {
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            _ => None,
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

    async fn dispatch(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        match step.action.to_ascii_lowercase().as_str() {
            "spawn" => self.dispatch_spawn(step, index).await,
            "write" => self.dispatch_write(step, index).await,
            "wait_for_output" => self.dispatch_wait_for_output(step, index, cancellation).await,
            "validate_output" => self.dispatch_validate_output(step, index).await,
            "validate_exit_code" => self.dispatch_validate_exit_code(step, index).await,
            "wait" => self.dispatch_wait(step, index, cancellation).await,
            other => Self::fail_result(index, AgentError::unsupported_action(other)),
        }
    }

    async fn dispatch_spawn(&mut self, step: &Step, index: usize) -> StepResult {
        let program = if step.target.trim().is_empty() {
            self.config.command.clone()
        } else {
            step.target.clone()
        };
        let args = Self::value_as_args(step).unwrap_or_else(|| self.config.args.clone());
        let mut env = self.config.env.clone();
        env.extend(self.pending_env.clone());

        match SessionProcess::spawn(&program, &args, &env, self.config.cwd.as_deref()) {
            Ok(process) => {
                let pid = process.pid();
                let handle = Arc::new(Mutex::new(process));
                ProcessRegistry::global().register(pid, &handle).await;
                self.process = Some(handle);
                Self::ok_result(index, Some(serde_json::json!({"pid": pid})))
            }
            Err(error) => Self::fail_result(index, error),
        }
    }

    async fn dispatch_write(&mut self, step: &Step, index: usize) -> StepResult {
        let Some(process) = &self.process else {
            return Self::fail_result(
                index,
                AgentError::NoResponse("write requires a spawned process".to_string()),
            );
        };
        let text = Self::value_as_str(step).unwrap_or_default();
        let mut process = process.lock().await;
        match process.write_line(&text).await {
            Ok(()) => Self::ok_result(index, None),
            Err(error) => Self::fail_result(index, error),
        }
    }

    async fn dispatch_wait_for_output(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        let Some(process) = &self.process else {
            return Self::fail_result(
                index,
                AgentError::NoResponse("wait_for_output requires a spawned process".to_string()),
            );
        };
        let timeout_ms = Self::value_as_str(step)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(self.config.default_wait_timeout_ms);
        let mut process = process.lock().await;
        match process
            .wait_for_output(&step.target, timeout_ms, cancellation)
            .await
        {
            Ok(captured) => Self::ok_result(
                index,
                Some(serde_json::Value::String(captured.combined_text())),
            ),
            Err(error) => Self::fail_result(index, error),
        }
    }

    async fn dispatch_validate_output(&mut self, step: &Step, index: usize) -> StepResult {
        let Some(process) = &self.process else {
            return Self::fail_result(
                index,
                AgentError::NoResponse("validate_output requires a spawned process".to_string()),
            );
        };
        let captured = process.lock().await.capture_output().await;
        let actual = match step.target.as_str() {
            "stdout" => captured
                .stdout
                .iter()
                .map(|event| event.data.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            "stderr" => captured
                .stderr
                .iter()
                .map(|event| event.data.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => captured.combined_text(),
        };
        let expected = step.expected.clone().unwrap_or(serde_json::Value::Null);
        match validate_output(&actual, &expected) {
            Ok(true) => Self::ok_result(index, Some(serde_json::Value::Bool(true))),
            Ok(false) => StepResult {
                step_index: index,
                status: StepStatus::Failed,
                duration_ms: 0,
                actual_result: Some(serde_json::Value::String(actual)),
                error: Some(
                    AgentError::Validation("output expectation not met".to_string()).step_error_text(),
                ),
                screenshot_path: None,
            },
            Err(error) => Self::fail_result(index, error),
        }
    }

    async fn dispatch_validate_exit_code(&mut self, step: &Step, index: usize) -> StepResult {
        let Some(process) = &self.process else {
            return Self::fail_result(
                index,
                AgentError::NoResponse("validate_exit_code requires a spawned process".to_string()),
            );
        };
        let expected = step
            .expected
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .map(|value| value as i32);
        let actual = process.lock().await.try_exit_code();
        match (actual, expected) {
            (Some(code), Some(expected_code)) if code == expected_code => {
                Self::ok_result(index, Some(serde_json::json!(code)))
            }
            (Some(code), _) => StepResult {
                step_index: index,
                status: StepStatus::Failed,
                duration_ms: 0,
                actual_result: Some(serde_json::json!(code)),
                error: Some(
                    AgentError::Validation(format!("exit code {code} did not match expectation"))
                        .step_error_text(),
                ),
                screenshot_path: None,
            },
            (None, _) => StepResult {
                step_index: index,
                status: StepStatus::Failed,
                duration_ms: 0,
                actual_result: None,
                error: Some(AgentError::Validation("process has not exited".to_string()).step_error_text()),
                screenshot_path: None,
            },
        }
    }

    async fn dispatch_wait(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult {
        let millis = Self::value_as_str(step)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);
        tokio::select! {
            _ = cancellation.cancelled() => Self::fail_result(index, AgentError::Cancelled),
            _ = tokio::time::sleep(std::time::Duration::from_millis(millis)) => Self::ok_result(index, None),
        }
    }
}

#[async_trait(?Send)]
impl Agent for SessionAgent {
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
        if self.config.command.trim().is_empty() {
            return Err(AgentError::Initialization(
                "session agent requires a non-empty command".to_string(),
            ));
        }
        self.state = AgentState::Ready;
        Ok(())
    }

    fn apply_environment(&mut self, environment: &BTreeMap<String, String>) {
        self.pending_env = environment.clone();
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
        if let Some(process) = self.process.take() {
            let pid = process.lock().await.pid();
            ProcessRegistry::global().deregister(pid).await;
            process.lock().await.terminate(self.config.grace_period_ms).await;
        }
        self.state = AgentState::Terminated;
    }
}
