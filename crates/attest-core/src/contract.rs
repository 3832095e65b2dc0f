//! Shared fixture-parsing helpers used by the contract-fixture pattern that
//! `attest-ui` and `attest-session` replay against in tests.
//!
//! Grounded on `tau-contract`'s fixture-validation helpers.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

pub fn parse_fixture_with_validation<F>(
    raw: &str,
    parse_error_context: &str,
    validate: impl FnOnce(&F) -> Result<()>,
) -> Result<F>
where
    F: DeserializeOwned,
{
    let fixture =
        serde_json::from_str::<F>(raw).with_context(|| parse_error_context.to_string())?;
    validate(&fixture)?;
    Ok(fixture)
}

pub fn load_fixture_from_path<F>(path: &Path, parse: impl FnOnce(&str) -> Result<F>) -> Result<F> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    parse(&raw).with_context(|| format!("invalid fixture {}", path.display()))
}

pub fn validate_fixture_header(
    contract_label: &str,
    schema_version: u32,
    expected_schema_version: u32,
    fixture_name: &str,
    case_count: usize,
) -> Result<()> {
    if schema_version != expected_schema_version {
        bail!(
            "unsupported {} contract schema version {} (expected {})",
            contract_label,
            schema_version,
            expected_schema_version
        );
    }
    if fixture_name.trim().is_empty() {
        bail!("fixture name cannot be empty");
    }
    if case_count == 0 {
        bail!("fixture must include at least one case");
    }
    Ok(())
}
