//! Per-scenario retry (§4.4): re-runs the full step sequence, discarding
//! every attempt but the last, until an attempt passes or the retry budget
//! is exhausted.

use std::collections::BTreeMap;

use attest_core::agent::Agent;
use attest_core::cancellation::CancellationToken;
use attest_core::model::{Scenario, TestFailure, TestResult, TestStatus};
use attest_core::time_utils::current_unix_timestamp_ms;

use crate::timeout::{run_attempt, AttemptOutcome};

fn synthetic_result(scenario_id: &str, start_time: i64, message: String, retries: u32) -> TestResult {
    let end_time = current_unix_timestamp_ms() as i64;
    TestResult {
        scenario_id: scenario_id.to_string(),
        status: TestStatus::Error,
        start_time,
        end_time,
        duration_ms: end_time.saturating_sub(start_time).max(0) as u64,
        step_results: Vec::new(),
        failures: vec![TestFailure {
            scenario_id: scenario_id.to_string(),
            timestamp: end_time,
            message,
            category: None,
            failed_step: None,
            stack_trace: None,
            logs: Vec::new(),
            screenshots: Vec::new(),
            is_known_issue: None,
        }],
        screenshots: Vec::new(),
        retries,
        metadata: BTreeMap::new(),
    }
}

/// Runs `scenario` to completion, retrying up to `max_retries` additional
/// times while the attempt does not pass. `TestResult.retries` is the
/// number of retries actually consumed (attempts beyond the first).
pub async fn run_with_retries(
    agent: &mut dyn Agent,
    scenario: &Scenario,
    timeout_ms: u64,
    max_retries: u32,
    session_cancellation: &CancellationToken,
) -> TestResult {
    let start_time = current_unix_timestamp_ms() as i64;
    let mut attempt_index = 0u32;

    loop {
        if session_cancellation.is_cancelled() {
            return synthetic_result(&scenario.id, start_time, "Cancelled".to_string(), attempt_index);
        }

        let outcome = run_attempt(agent, scenario, timeout_ms, session_cancellation).await;
        let result = match outcome {
            AttemptOutcome::Completed(mut result) => {
                result.retries = attempt_index;
                result
            }
            AttemptOutcome::TimedOut => synthetic_result(
                &scenario.id,
                start_time,
                attest_core::error::AgentError::timeout(format!("scenario exceeded {timeout_ms}ms")).step_error_text(),
                attempt_index,
            ),
            AttemptOutcome::SessionCancelled => {
                synthetic_result(&scenario.id, start_time, "Cancelled".to_string(), attempt_index)
            }
            AttemptOutcome::SetupError(error) => {
                synthetic_result(&scenario.id, start_time, error.step_error_text(), attempt_index)
            }
        };

        if result.status == TestStatus::Passed || attempt_index >= max_retries {
            return result;
        }
        attempt_index += 1;
    }
}
