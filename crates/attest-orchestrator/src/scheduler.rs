//! The scenario scheduler (§4.4): a bounded worker pool over the scenario
//! set, with prerequisite gating, per-scenario retry/timeout, and a
//! cancel-on-first-failure policy toggle.
//!
//! Concurrency is dispatched in prerequisite-respecting waves: every
//! scenario whose prerequisites have all passed is spawned in the same
//! wave (bounded by `max_parallel` via a `tokio::sync::Semaphore`), and the
//! next wave is computed once the current one drains. `Agent` is `?Send`
//! (non-Send interior state, matching the agent trait objects elsewhere in
//! this workspace), so scenarios run on a `tokio::task::LocalSet` via `spawn_local` rather than
//! `tokio::spawn`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use attest_core::agent::Agent;
use attest_core::cancellation::CancellationToken;
use attest_core::error::AgentError;
use attest_core::model::{Scenario, TestFailure, TestResult, TestStatus};
use attest_core::time_utils::current_unix_timestamp_ms;
use tokio::sync::Semaphore;
use tokio::task::LocalSet;

use crate::config::OrchestratorConfig;
use crate::registry::{build_agent, primary_role};
use crate::retry::run_with_retries;
use crate::session::TestSession;
use crate::triage::TriagePipeline;

pub struct Orchestrator {
    config: OrchestratorConfig,
}

fn skipped_result(scenario_id: &str, reason: &str) -> TestResult {
    let now = current_unix_timestamp_ms() as i64;
    TestResult {
        scenario_id: scenario_id.to_string(),
        status: TestStatus::Skipped,
        start_time: now,
        end_time: now,
        duration_ms: 0,
        step_results: Vec::new(),
        failures: vec![TestFailure {
            scenario_id: scenario_id.to_string(),
            timestamp: now,
            message: reason.to_string(),
            category: None,
            failed_step: None,
            stack_trace: None,
            logs: Vec::new(),
            screenshots: Vec::new(),
            is_known_issue: None,
        }],
        screenshots: Vec::new(),
        retries: 0,
        metadata: BTreeMap::new(),
    }
}

fn initialization_failed_result(scenario_id: &str, error: &AgentError) -> TestResult {
    let now = current_unix_timestamp_ms() as i64;
    TestResult {
        scenario_id: scenario_id.to_string(),
        status: TestStatus::Error,
        start_time: now,
        end_time: now,
        duration_ms: 0,
        step_results: Vec::new(),
        failures: vec![TestFailure {
            scenario_id: scenario_id.to_string(),
            timestamp: now,
            message: error.step_error_text(),
            category: None,
            failed_step: None,
            stack_trace: None,
            logs: Vec::new(),
            screenshots: Vec::new(),
            is_known_issue: None,
        }],
        screenshots: Vec::new(),
        retries: 0,
        metadata: BTreeMap::new(),
    }
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Runs every enabled scenario to completion and returns the session's
    /// aggregate record. Disabled scenarios are recorded `Skipped` up
    /// front and never dispatched.
    ///
    /// §2: every scenario that finishes `Failed`/`Error` is forwarded to the
    /// triage pipeline, and on to the issue reporter when its assigned
    /// priority meets `issue_priority_threshold`.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> TestSession {
        let session_start = current_unix_timestamp_ms() as i64;
        let session_id = format!("session-{session_start}");
        let triage = TriagePipeline::load(&self.config).await;

        let local = LocalSet::new();
        let results = local.run_until(self.run_scenarios(scenarios, triage.as_ref())).await;

        let session_end = current_unix_timestamp_ms() as i64;
        TestSession::new(session_id, session_start, session_end, results)
    }

    async fn run_scenarios(&self, scenarios: Vec<Scenario>, triage: Option<&TriagePipeline>) -> Vec<TestResult> {
        let all_ids: BTreeSet<String> = scenarios.iter().map(|scenario| scenario.id.clone()).collect();
        let mut pending: BTreeMap<String, Scenario> = BTreeMap::new();
        let mut order: Vec<String> = Vec::with_capacity(scenarios.len());
        let mut completed: BTreeMap<String, TestStatus> = BTreeMap::new();
        let mut results: BTreeMap<String, TestResult> = BTreeMap::new();

        for scenario in scenarios {
            order.push(scenario.id.clone());
            if !scenario.enabled {
                completed.insert(scenario.id.clone(), TestStatus::Skipped);
                results.insert(scenario.id.clone(), skipped_result(&scenario.id, "scenario disabled"));
                continue;
            }
            pending.insert(scenario.id.clone(), scenario);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.execution.max_parallel.max(1)));
        let session_cancellation = CancellationToken::new();
        let mut stop_dispatch = false;

        while !pending.is_empty() {
            let ready: Vec<String> = pending
                .values()
                .filter(|scenario| {
                    scenario.prerequisites.iter().all(|prerequisite| completed.get(prerequisite) == Some(&TestStatus::Passed))
                })
                .map(|scenario| scenario.id.clone())
                .collect();

            if stop_dispatch || ready.is_empty() {
                for (id, scenario) in pending.drain() {
                    let reason = if stop_dispatch {
                        "session cancelled after an earlier scenario failed"
                    } else if scenario.prerequisites.iter().any(|prerequisite| !all_ids.contains(prerequisite)) {
                        "unresolved prerequisite does not exist in this run"
                    } else {
                        "prerequisite did not pass"
                    };
                    completed.insert(id.clone(), TestStatus::Skipped);
                    results.insert(id, skipped_result(&scenario.id, reason));
                }
                break;
            }

            let mut handles = Vec::with_capacity(ready.len());
            for id in &ready {
                let scenario = pending.remove(id).expect("ready id was drawn from pending");
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore is never closed");
                let session_cancellation = session_cancellation.clone();
                let timeout_ms = scenario.timeout_ms.unwrap_or(self.config.execution.default_timeout_ms);
                let max_retries = scenario.retries.unwrap_or(self.config.execution.max_retries);
                let handle = tokio::task::spawn_local(async move {
                    let _permit = permit;
                    let outcome = run_scenario(&scenario, timeout_ms, max_retries, &session_cancellation).await;
                    (scenario, outcome)
                });
                handles.push(handle);
            }

            for handle in handles {
                let (scenario, result) = handle.await.expect("scenario task should not panic");
                if let Some(triage) = triage {
                    triage.forward(&scenario, &result).await;
                }
                if !self.config.execution.continue_on_failure && result.status != TestStatus::Passed {
                    stop_dispatch = true;
                    session_cancellation.cancel();
                }
                completed.insert(scenario.id.clone(), result.status);
                results.insert(scenario.id, result);
            }
        }

        order.into_iter().filter_map(|id| results.remove(&id)).collect()
    }
}

async fn run_scenario(
    scenario: &Scenario,
    timeout_ms: u64,
    max_retries: u32,
    session_cancellation: &CancellationToken,
) -> TestResult {
    let Some(role) = primary_role(scenario) else {
        return initialization_failed_result(
            &scenario.id,
            &AgentError::initialization("scenario declares no agent role"),
        );
    };
    let mut agent: Box<dyn Agent> = build_agent(role);

    if let Err(error) = agent.initialize().await {
        return initialization_failed_result(&scenario.id, &error);
    }

    let result = run_with_retries(agent.as_mut(), scenario, timeout_ms, max_retries, session_cancellation).await;
    agent.cleanup().await;
    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use attest_core::config::ExecutionConfig;
    use attest_core::model::{AgentRoleConfig, AgentType, Step};
    use tempfile::TempDir;

    use super::*;

    /// Builds a config pointed at a scratch priority-history file so tests
    /// never touch a real `.priority-history.json` in the crate directory.
    /// The returned `TempDir` must outlive the `Orchestrator` using it.
    fn test_config(execution: ExecutionConfig) -> (OrchestratorConfig, TempDir) {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let history_path = tempdir.path().join("history.json").to_string_lossy().to_string();
        let config = OrchestratorConfig {
            execution,
            triage: attest_triage::TriageConfig { history_path, ..attest_triage::TriageConfig::default() },
            ..OrchestratorConfig::default()
        };
        (config, tempdir)
    }

    fn api_scenario(id: &str, prerequisites: Vec<&str>) -> Scenario {
        let mut agents = BTreeMap::new();
        agents.insert(
            "primary".to_string(),
            AgentRoleConfig { agent_type: AgentType::System, config: serde_json::json!({}) },
        );
        Scenario {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            prerequisites: prerequisites.into_iter().map(str::to_string).collect(),
            agents,
            steps: vec![Step {
                action: "check_process".to_string(),
                target: "nonexistent-process-xyz".to_string(),
                value: None,
                expected: Some(serde_json::json!(false)),
                timeout_ms: None,
                description: String::new(),
                continue_on_failure: false,
            }],
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

    #[tokio::test(flavor = "current_thread")]
    async fn functional_independent_scenarios_all_run() {
        let (config, _tempdir) = test_config(ExecutionConfig { max_parallel: 2, ..ExecutionConfig::default() });
        let orchestrator = Orchestrator::new(config);
        let session = orchestrator.run(vec![api_scenario("a", vec![]), api_scenario("b", vec![])]).await;
        assert_eq!(session.summary.total, 2);
        assert!(session.summary.is_consistent());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn functional_disabled_scenario_is_skipped_without_running() {
        let (config, _tempdir) = test_config(ExecutionConfig::default());
        let orchestrator = Orchestrator::new(config);
        let mut scenario = api_scenario("a", vec![]);
        scenario.enabled = false;
        let session = orchestrator.run(vec![scenario]).await;
        assert_eq!(session.results[0].status, TestStatus::Skipped);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn regression_scenario_with_missing_prerequisite_is_skipped() {
        let (config, _tempdir) = test_config(ExecutionConfig::default());
        let orchestrator = Orchestrator::new(config);
        let session = orchestrator.run(vec![api_scenario("a", vec!["nonexistent"])]).await;
        assert_eq!(session.results[0].status, TestStatus::Skipped);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn integration_session_invariant_holds_across_mixed_outcomes() {
        let (config, _tempdir) = test_config(ExecutionConfig::default());
        let orchestrator = Orchestrator::new(config);
        let session = orchestrator
            .run(vec![api_scenario("a", vec![]), api_scenario("b", vec!["missing"])])
            .await;
        assert_eq!(session.summary.total, 2);
        assert!(session.summary.is_consistent());
        assert_eq!(session.results.len(), session.summary.total);
    }
}
