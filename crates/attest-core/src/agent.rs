//! The polymorphic `Agent` contract (§4.1) and its execution template.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;

use crate::cancellation::CancellationToken;
use crate::error::AgentError;
use crate::model::{Scenario, Step, StepResult, StepStatus, TestFailure, TestResult, TestStatus};
use crate::time_utils::current_unix_timestamp_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    Ready,
    Running,
    Terminated,
}

/// The capability set every agent variant (API, CLI, TUI, UI, SYSTEM,
/// ISSUE, PRIORITY, COMPREHENSION) must implement. `?Send` matches the
/// teacher's `OrchestratorRuntime`/tool-bridge traits, which hold
/// non-`Send` interior state (process handles, in-flight HTTP bodies).
#[async_trait(?Send)]
pub trait Agent {
    fn state(&self) -> AgentState;

    /// Default per-step timeout used when a step does not specify its own.
    fn default_timeout_ms(&self) -> u64;

    /// Fails with `AgentError::Initialization` when a required external
    /// resource is unreachable. May only be called from `Uninitialized`.
    async fn initialize(&mut self) -> Result<(), AgentError>;

    /// Applies `scenario.environment` to the agent; agent-type-specific
    /// (e.g. the HTTP agent maps `API_BASE_URL`/`API_TIMEOUT`/`API_AUTH_TOKEN`).
    fn apply_environment(&mut self, environment: &BTreeMap<String, String>);

    /// Executes one step. Fails with `AgentError::Action` for an unsupported
    /// `step.action`, `AgentError::Timeout` when the step exceeds its
    /// deadline. May only be called from `Ready`.
    async fn execute_step(
        &mut self,
        step: &Step,
        index: usize,
        cancellation: &CancellationToken,
    ) -> StepResult;

    /// Best-effort teardown; never propagates an error to the caller and is
    /// idempotent.
    async fn cleanup(&mut self);
}

fn classify_step_failure(scenario_id: &str, step: &Step, index: usize, result: &StepResult) -> Option<TestFailure> {
    if result.status == StepStatus::Passed || result.status == StepStatus::Skipped {
        return None;
    }
    Some(TestFailure {
        scenario_id: scenario_id.to_string(),
        timestamp: current_unix_timestamp_ms() as i64,
        message: result
            .error
            .clone()
            .unwrap_or_else(|| format!("step {index} ({}) failed", step.action)),
        category: None,
        failed_step: Some(index),
        stack_trace: None,
        logs: Vec::new(),
        screenshots: result
            .screenshot_path
            .clone()
            .into_iter()
            .collect(),
        is_known_issue: None,
    })
}

/// The `execute(scenario) -> TestResult` template method from §4.1: applies
/// the environment, runs steps sequentially (stopping early only when
/// `scenario.continue_on_failure` is false and a step's own
/// `continue_on_failure` opt-in is also false), then runs cleanup steps
/// unconditionally before aggregating the result.
pub async fn execute_scenario<A: Agent + ?Sized>(
    agent: &mut A,
    scenario: &Scenario,
    cancellation: &CancellationToken,
) -> Result<TestResult, AgentError> {
    if agent.state() != AgentState::Ready {
        return Err(AgentError::NotInitialized(
            "execute() requires the agent to be Ready".to_string(),
        ));
    }

    let start_time = current_unix_timestamp_ms() as i64;
    agent.apply_environment(&scenario.environment);

    let mut step_results = Vec::with_capacity(scenario.steps.len());
    let mut failures = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        if cancellation.is_cancelled() {
            step_results.push(StepResult {
                step_index: index,
                status: StepStatus::Error,
                duration_ms: 0,
                actual_result: None,
                error: Some(AgentError::Cancelled.step_error_text()),
                screenshot_path: None,
            });
            break;
        }

        let started = Instant::now();
        let result = agent.execute_step(step, index, cancellation).await;
        let result = StepResult {
            duration_ms: started.elapsed().as_millis() as u64,
            ..result
        };

        if let Some(failure) = classify_step_failure(&scenario.id, step, index, &result) {
            failures.push(failure);
        }

        let should_stop = result.status != StepStatus::Passed
            && !scenario.continue_on_failure
            && !step.continue_on_failure;
        step_results.push(result);
        if should_stop {
            break;
        }
    }

    let mut cleanup_failures = Vec::new();
    for (index, step) in scenario.cleanup.iter().enumerate() {
        let started = Instant::now();
        let result = agent
            .execute_step(step, scenario.steps.len() + index, cancellation)
            .await;
        let result = StepResult {
            duration_ms: started.elapsed().as_millis() as u64,
            ..result
        };
        if let Some(failure) =
            classify_step_failure(&scenario.id, step, scenario.steps.len() + index, &result)
        {
            cleanup_failures.push(failure);
        }
    }
    // Cleanup failures are recorded but never override the primary status.
    failures.extend(cleanup_failures);

    let end_time = current_unix_timestamp_ms() as i64;
    let status = if cancellation.is_cancelled() {
        TestStatus::Error
    } else if step_results
        .iter()
        .any(|result| result.status == StepStatus::Error)
    {
        TestStatus::Error
    } else if step_results
        .iter()
        .any(|result| result.status == StepStatus::Failed)
    {
        TestStatus::Failed
    } else {
        TestStatus::Passed
    };

    Ok(TestResult {
        scenario_id: scenario.id.clone(),
        status,
        start_time,
        end_time,
        duration_ms: end_time.saturating_sub(start_time).max(0) as u64,
        step_results,
        failures,
        screenshots: Vec::new(),
        retries: 0,
        metadata: BTreeMap::new(),
    })
}
