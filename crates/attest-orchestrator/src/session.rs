//! The orchestrator's output record (§4.4): a single `TestSession`
//! aggregating every scenario's `TestResult` plus pass/fail counts.
//!
//! `TestSession` lives here rather than in `attest-core::model` because it
//! is a run-level aggregate the orchestrator produces, not part of the
//! scenario schema every agent shares.

use attest_core::model::{TestResult, TestStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub error: usize,
    pub skipped: usize,
}

impl SessionSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = SessionSummary { total: results.len(), ..Default::default() };
        for result in results {
            match result.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Error => summary.error += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// §8 universal invariant: `sum(summary.*) == session.results.len()`.
    pub fn is_consistent(&self) -> bool {
        self.passed + self.failed + self.error + self.skipped == self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSession {
    pub session_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub results: Vec<TestResult>,
    pub summary: SessionSummary,
}

impl TestSession {
    pub fn new(session_id: String, start_time: i64, end_time: i64, results: Vec<TestResult>) -> Self {
        let summary = SessionSummary::from_results(&results);
        Self { session_id, start_time, end_time, results, summary }
    }
}

#[cfg(test)]
mod tests {
    use attest_core::model::{TestResult, TestStatus};
    use std::collections::BTreeMap;

    use super::{SessionSummary, TestSession};

    fn result(id: &str, status: TestStatus) -> TestResult {
        TestResult {
            scenario_id: id.to_string(),
            status,
            start_time: 0,
            end_time: 0,
            duration_ms: 0,
            step_results: Vec::new(),
            failures: Vec::new(),
            screenshots: Vec::new(),
            retries: 0,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn unit_summary_from_results_counts_each_status() {
        let results = vec![
            result("a", TestStatus::Passed),
            result("b", TestStatus::Failed),
            result("c", TestStatus::Error),
            result("d", TestStatus::Skipped),
            result("e", TestStatus::Passed),
        ];
        let summary = SessionSummary::from_results(&results);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.error, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.is_consistent());
    }

    #[test]
    fn functional_test_session_new_computes_summary_from_results() {
        let results = vec![result("a", TestStatus::Passed)];
        let session = TestSession::new("session-1".to_string(), 0, 10, results);
        assert_eq!(session.summary.total, 1);
        assert_eq!(session.summary.passed, 1);
    }

    #[test]
    fn regression_empty_results_yield_zeroed_consistent_summary() {
        let summary = SessionSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.is_consistent());
    }
}
