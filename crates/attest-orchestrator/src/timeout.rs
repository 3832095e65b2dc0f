//! Per-attempt timeout and cancellation (§4.4): races one `execute_scenario`
//! attempt against a deadline and the session-wide cancellation signal.
//!
//! Grounded on `tau-coding-agent`'s `run_prompt_with_cancellation`: a
//! `tokio::select!` over the work future, a sleep deadline, and a
//! cancellation future, each arm cancelling cooperatively and then giving
//! the in-flight work a short grace period to unwind before reporting the
//! outcome.

use std::time::Duration;

use attest_core::agent::{execute_scenario, Agent};
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Scenario, TestResult};

const CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(1);

pub enum AttemptOutcome {
    Completed(TestResult),
    TimedOut,
    SessionCancelled,
    SetupError(AgentError),
}

/// Runs one `execute_scenario` attempt, bounded by `timeout_ms` and racing
/// `session_cancellation`. The agent must already be `Ready`.
pub async fn run_attempt(
    agent: &mut dyn Agent,
    scenario: &Scenario,
    timeout_ms: u64,
    session_cancellation: &CancellationToken,
) -> AttemptOutcome {
    let attempt_cancellation = CancellationToken::new();
    let mut exec_future = std::pin::pin!(execute_scenario(agent, scenario, &attempt_cancellation));
    let sleep = tokio::time::sleep(Duration::from_millis(timeout_ms));
    tokio::pin!(sleep);

    tokio::select! {
        result = &mut exec_future => {
            match result {
                Ok(test_result) => AttemptOutcome::Completed(test_result),
                Err(error) => AttemptOutcome::SetupError(error),
            }
        }
        _ = &mut sleep => {
            attempt_cancellation.cancel();
            let _ = tokio::time::timeout(CANCEL_GRACE_PERIOD, &mut exec_future).await;
            AttemptOutcome::TimedOut
        }
        _ = session_cancellation.cancelled() => {
            attempt_cancellation.cancel();
            let _ = tokio::time::timeout(CANCEL_GRACE_PERIOD, &mut exec_future).await;
            AttemptOutcome::SessionCancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use attest_core::agent::AgentState;
    use attest_core::error::AgentError;
    use attest_core::model::{Step, StepResult, StepStatus};

    use super::*;

    struct SlowAgent {
        state: AgentState,
        step_delay_ms: u64,
    }

    #[async_trait(?Send)]
    impl Agent for SlowAgent {
        fn state(&self) -> AgentState {
            self.state
        }

        fn default_timeout_ms(&self) -> u64 {
            1_000
        }

        async fn initialize(&mut self) -> Result<(), AgentError> {
            self.state = AgentState::Ready;
            Ok(())
        }

        fn apply_environment(&mut self, _environment: &BTreeMap<String, String>) {}

        async fn execute_step(&mut self, _step: &Step, index: usize, _cancellation: &CancellationToken) -> StepResult {
            tokio::time::sleep(Duration::from_millis(self.step_delay_ms)).await;
            StepResult {
                step_index: index,
                status: StepStatus::Passed,
                duration_ms: 0,
                actual_result: None,
                error: None,
                screenshot_path: None,
            }
        }

        async fn cleanup(&mut self) {}
    }

    fn scenario(step_count: usize) -> Scenario {
        Scenario {
            id: "s1".to_string(),
            name: "s1".to_string(),
            description: String::new(),
            prerequisites: Vec::new(),
            agents: BTreeMap::new(),
            steps: (0..step_count)
                .map(|i| Step {
                    action: format!("step{i}"),
                    target: String::new(),
                    value: None,
                    expected: None,
                    timeout_ms: None,
                    description: String::new(),
                    continue_on_failure: false,
                })
                .collect(),
            verifications: Vec::new(),
            cleanup: Vec::new(),
            environment: BTreeMap::new(),
            timeout_ms: None,
            retries: None,
            priority_hint: None,
            tags: Default::default(),
            enabled: true,
            continue_on_failure: false,
        }
    }

    #[tokio::test]
    async fn functional_fast_scenario_completes_within_timeout() {
        let mut agent = SlowAgent { state: AgentState::Ready, step_delay_ms: 5 };
        let outcome = run_attempt(&mut agent, &scenario(2), 1_000, &CancellationToken::new()).await;
        assert!(matches!(outcome, AttemptOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn regression_slow_scenario_times_out() {
        let mut agent = SlowAgent { state: AgentState::Ready, step_delay_ms: 500 };
        let outcome = run_attempt(&mut agent, &scenario(5), 30, &CancellationToken::new()).await;
        assert!(matches!(outcome, AttemptOutcome::TimedOut));
    }

    #[tokio::test]
    async fn integration_session_cancellation_short_circuits_attempt() {
        let mut agent = SlowAgent { state: AgentState::Ready, step_delay_ms: 500 };
        let session_cancellation = CancellationToken::new();
        session_cancellation.cancel();
        let outcome = run_attempt(&mut agent, &scenario(5), 10_000, &session_cancellation).await;
        assert!(matches!(outcome, AttemptOutcome::SessionCancelled));
    }
}
