//! The UI agent's reference action vocabulary (§4.1 "UI agent"): a
//! deterministic in-memory fixture responder, never a live browser backend.
//! Mirrors the browser-automation contract/fixture-replay pattern used
//! elsewhere in this workspace, which occupies exactly this scope.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const UI_CONTRACT_SCHEMA_VERSION: u32 = 1;

pub const UI_ERROR_INVALID_OPERATION: &str = "ui_invalid_operation";
pub const UI_ERROR_INVALID_URL: &str = "ui_invalid_url";
pub const UI_ERROR_INVALID_SELECTOR: &str = "ui_invalid_selector";
pub const UI_ERROR_INVALID_INPUT: &str = "ui_invalid_input";
pub const UI_ERROR_TIMEOUT: &str = "ui_timeout";
pub const UI_ERROR_BACKEND_UNAVAILABLE: &str = "ui_backend_unavailable";

fn ui_contract_schema_version() -> u32 {
    UI_CONTRACT_SCHEMA_VERSION
}

fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UiOutcomeKind {
    Success,
    MalformedInput,
    RetryableFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiCaseExpectation {
    pub outcome: UiOutcomeKind,
    pub status_code: u16,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub response_body: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiContractCase {
    #[serde(default = "ui_contract_schema_version")]
    pub schema_version: u32,
    pub case_id: String,
    pub operation: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub simulate_retryable_failure: bool,
    #[serde(default)]
    pub simulate_timeout: bool,
    pub expected: UiCaseExpectation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiContractFixture {
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cases: Vec<UiContractCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiContractCapabilities {
    pub schema_version: u32,
    pub supported_outcomes: BTreeSet<UiOutcomeKind>,
    pub supported_error_codes: BTreeSet<String>,
    pub supported_operations: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiReplayStep {
    Success,
    MalformedInput,
    RetryableFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiReplayResult {
    pub step: UiReplayStep,
    pub status_code: u16,
    pub error_code: Option<String>,
    pub response_body: serde_json::Value,
}

#[cfg(test)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiReplaySummary {
    pub discovered_cases: usize,
    pub success_cases: usize,
    pub malformed_cases: usize,
    pub retryable_failures: usize,
}

#[cfg(test)]
pub trait UiContractDriver {
    fn apply_case(&mut self, case: &UiContractCase) -> Result<UiReplayResult>;
}

pub fn parse_ui_contract_fixture(raw: &str) -> Result<UiContractFixture> {
    let fixture = serde_json::from_str::<UiContractFixture>(raw)
        .context("failed to parse UI contract fixture")?;
    validate_ui_contract_fixture(&fixture)?;
    Ok(fixture)
}

pub fn load_ui_contract_fixture(path: &Path) -> Result<UiContractFixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    parse_ui_contract_fixture(&raw).with_context(|| format!("invalid fixture {}", path.display()))
}

pub fn ui_contract_capabilities() -> UiContractCapabilities {
    UiContractCapabilities {
        schema_version: UI_CONTRACT_SCHEMA_VERSION,
        supported_outcomes: [
            UiOutcomeKind::Success,
            UiOutcomeKind::MalformedInput,
            UiOutcomeKind::RetryableFailure,
        ]
        .into_iter()
        .collect(),
        supported_error_codes: supported_error_codes()
            .iter()
            .map(|code| (*code).to_string())
            .collect(),
        supported_operations: supported_operations()
            .iter()
            .map(|operation| (*operation).to_string())
            .collect(),
    }
}

pub fn validate_ui_contract_compatibility(fixture: &UiContractFixture) -> Result<()> {
    let capabilities = ui_contract_capabilities();
    if fixture.schema_version != capabilities.schema_version {
        bail!(
            "unsupported UI contract schema version {} (expected {})",
            fixture.schema_version,
            capabilities.schema_version
        );
    }

    for case in &fixture.cases {
        if !capabilities.supported_outcomes.contains(&case.expected.outcome) {
            bail!(
                "fixture case '{}' uses unsupported outcome {:?}",
                case.case_id,
                case.expected.outcome
            );
        }

        let expected_code = case.expected.error_code.trim();
        if !expected_code.is_empty() && !capabilities.supported_error_codes.contains(expected_code) {
            bail!(
                "fixture case '{}' uses unsupported error_code '{}'",
                case.case_id,
                expected_code
            );
        }

        let operation = normalize_operation(&case.operation);
        if case.expected.outcome != UiOutcomeKind::MalformedInput
            && !capabilities.supported_operations.contains(&operation)
        {
            bail!(
                "fixture case '{}' uses unsupported operation '{}' for non-malformed outcome",
                case.case_id,
                case.operation
            );
        }
    }
    Ok(())
}

pub fn validate_ui_contract_fixture(fixture: &UiContractFixture) -> Result<()> {
    if fixture.schema_version != UI_CONTRACT_SCHEMA_VERSION {
        bail!(
            "unsupported UI contract schema version {} (expected {})",
            fixture.schema_version,
            UI_CONTRACT_SCHEMA_VERSION
        );
    }
    if fixture.name.trim().is_empty() {
        bail!("fixture name cannot be empty");
    }
    if fixture.cases.is_empty() {
        bail!("fixture must include at least one case");
    }

    let mut case_ids = HashSet::new();
    for (index, case) in fixture.cases.iter().enumerate() {
        validate_ui_case(case, index)?;
        let case_id = case.case_id.trim().to_string();
        if !case_ids.insert(case_id.clone()) {
            bail!("fixture contains duplicate case_id '{}'", case_id);
        }
    }

    validate_ui_contract_compatibility(fixture)?;
    Ok(())
}

pub fn evaluate_ui_case(case: &UiContractCase) -> UiReplayResult {
    if case.simulate_retryable_failure {
        return UiReplayResult {
            step: UiReplayStep::RetryableFailure,
            status_code: 503,
            error_code: Some(UI_ERROR_BACKEND_UNAVAILABLE.to_string()),
            response_body: json!({"status":"retryable","reason":"backend_unavailable"}),
        };
    }

    if case.simulate_timeout {
        return UiReplayResult {
            step: UiReplayStep::RetryableFailure,
            status_code: 504,
            error_code: Some(UI_ERROR_TIMEOUT.to_string()),
            response_body: json!({"status":"retryable","reason":"timeout"}),
        };
    }

    let operation = normalize_operation(&case.operation);
    if !supported_operations().contains(&operation.as_str()) {
        return UiReplayResult {
            step: UiReplayStep::MalformedInput,
            status_code: 400,
            error_code: Some(UI_ERROR_INVALID_OPERATION.to_string()),
            response_body: json!({"status":"rejected","reason":"invalid_operation"}),
        };
    }

    if operation == "navigate" {
        let url = case.url.trim();
        if !is_valid_url(url) {
            return UiReplayResult {
                step: UiReplayStep::MalformedInput,
                status_code: 400,
                error_code: Some(UI_ERROR_INVALID_URL.to_string()),
                response_body: json!({"status":"rejected","reason":"invalid_url"}),
            };
        }
        return UiReplayResult {
            step: UiReplayStep::Success,
            status_code: 200,
            error_code: None,
            response_body: json!({
                "status": "ok",
                "operation": "navigate",
                "url": url,
                "title": format!("Fixture page for {}", case.case_id.trim()),
                "dom_nodes": 96,
            }),
        };
    }

    if operation == "snapshot" {
        return UiReplayResult {
            step: UiReplayStep::Success,
            status_code: 200,
            error_code: None,
            response_body: json!({
                "status": "ok",
                "operation": "snapshot",
                "snapshot_id": format!("snapshot-{}", case.case_id.trim()),
                "elements": [
                    {"id":"e1","role":"link","name":"Docs"},
                    {"id":"e2","role":"button","name":"Submit"}
                ],
            }),
        };
    }

    if operation == "wait" {
        return UiReplayResult {
            step: UiReplayStep::Success,
            status_code: 200,
            error_code: None,
            response_body: json!({
                "status": "ok",
                "operation": "wait",
                "waited_ms": case.timeout_ms,
            }),
        };
    }

    if case.selector.trim().is_empty() {
        return UiReplayResult {
            step: UiReplayStep::MalformedInput,
            status_code: 422,
            error_code: Some(UI_ERROR_INVALID_SELECTOR.to_string()),
            response_body: json!({"status":"rejected","reason":"invalid_selector"}),
        };
    }

    if operation == "type" && case.text.trim().is_empty() {
        return UiReplayResult {
            step: UiReplayStep::MalformedInput,
            status_code: 422,
            error_code: Some(UI_ERROR_INVALID_INPUT.to_string()),
            response_body: json!({"status":"rejected","reason":"invalid_input"}),
        };
    }

    UiReplayResult {
        step: UiReplayStep::Success,
        status_code: 200,
        error_code: None,
        response_body: json!({
            "status": "ok",
            "operation": operation,
            "selector": case.selector.trim(),
            "text": case.text.trim(),
        }),
    }
}

pub fn assert_ui_result_matches_expectation(
    case: &UiContractCase,
    result: &UiReplayResult,
) -> Result<()> {
    let expected_step = match case.expected.outcome {
        UiOutcomeKind::Success => UiReplayStep::Success,
        UiOutcomeKind::MalformedInput => UiReplayStep::MalformedInput,
        UiOutcomeKind::RetryableFailure => UiReplayStep::RetryableFailure,
    };
    if result.step != expected_step {
        bail!(
            "case '{}' expected outcome {:?} but runtime returned {:?}",
            case.case_id,
            case.expected.outcome,
            result.step
        );
    }
    if result.status_code != case.expected.status_code {
        bail!(
            "case '{}' expected status_code {} but runtime returned {}",
            case.case_id,
            case.expected.status_code,
            result.status_code
        );
    }

    let expected_code = case.expected.error_code.trim();
    let actual_code = result.error_code.as_deref().unwrap_or_default().trim();
    if expected_code != actual_code {
        bail!(
            "case '{}' expected error_code '{}' but runtime returned '{}'",
            case.case_id,
            expected_code,
            actual_code
        );
    }

    if !case.expected.response_body.is_null() && result.response_body != case.expected.response_body {
        bail!(
            "case '{}' expected response_body {} but runtime returned {}",
            case.case_id,
            case.expected.response_body,
            result.response_body
        );
    }

    Ok(())
}

#[cfg(test)]
pub fn run_ui_contract_replay<D: UiContractDriver>(
    fixture: &UiContractFixture,
    driver: &mut D,
) -> Result<UiReplaySummary> {
    validate_ui_contract_fixture(fixture)?;
    let mut summary = UiReplaySummary {
        discovered_cases: fixture.cases.len(),
        ..UiReplaySummary::default()
    };

    for case in &fixture.cases {
        let result = driver.apply_case(case)?;
        assert_ui_result_matches_expectation(case, &result)?;
        match case.expected.outcome {
            UiOutcomeKind::Success => summary.success_cases = summary.success_cases.saturating_add(1),
            UiOutcomeKind::MalformedInput => {
                summary.malformed_cases = summary.malformed_cases.saturating_add(1)
            }
            UiOutcomeKind::RetryableFailure => {
                summary.retryable_failures = summary.retryable_failures.saturating_add(1)
            }
        }
    }

    Ok(summary)
}

fn validate_ui_case(case: &UiContractCase, index: usize) -> Result<()> {
    if case.schema_version != UI_CONTRACT_SCHEMA_VERSION {
        bail!(
            "fixture case index {} has unsupported schema_version {} (expected {})",
            index,
            case.schema_version,
            UI_CONTRACT_SCHEMA_VERSION
        );
    }
    if case.case_id.trim().is_empty() {
        bail!("fixture case index {} has empty case_id", index);
    }
    if case.timeout_ms == 0 {
        bail!(
            "fixture case '{}' has timeout_ms 0; expected at least 1",
            case.case_id
        );
    }
    Ok(())
}

fn supported_operations() -> [&'static str; 5] {
    ["navigate", "click", "type", "wait", "snapshot"]
}

fn supported_error_codes() -> [&'static str; 6] {
    [
        UI_ERROR_INVALID_OPERATION,
        UI_ERROR_INVALID_URL,
        UI_ERROR_INVALID_SELECTOR,
        UI_ERROR_INVALID_INPUT,
        UI_ERROR_TIMEOUT,
        UI_ERROR_BACKEND_UNAVAILABLE,
    ]
}

fn normalize_operation(operation: &str) -> String {
    operation.trim().to_ascii_lowercase()
}

fn is_valid_url(url: &str) -> bool {
    let trimmed = url.trim();
    !trimmed.is_empty() && (trimmed.starts_with("http://") || trimmed.starts_with("https://"))
}
