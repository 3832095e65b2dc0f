//! Scenario file discovery and parsing (§6 "Scenario input (in-memory
//! schema only)"). A YAML loader is explicitly out of scope; this loader
//! reads one JSON document per scenario, already shaped like
//! `attest_core::model::Scenario`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use attest_core::model::Scenario;

#[derive(Debug)]
pub struct LoadError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub scenarios: Vec<Scenario>,
    pub errors: Vec<LoadError>,
}

fn scenario_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
        .with_context(|| format!("failed to read scenario directory {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    files.sort();
    Ok(files)
}

pub fn load_scenario_file(path: &Path) -> Result<Scenario, String> {
    let raw = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    serde_json::from_str(&raw).map_err(|error| error.to_string())
}

/// Loads every `*.json` file in `directory`, collecting parse failures
/// instead of aborting on the first one.
pub fn load_directory(directory: &Path) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome::default();
    for path in scenario_files(directory)? {
        match load_scenario_file(&path) {
            Ok(scenario) => outcome.scenarios.push(scenario),
            Err(message) => outcome.errors.push(LoadError { path, message }),
        }
    }
    Ok(outcome)
}

/// Structural warnings beyond "does it parse": duplicate ids and scenarios
/// with no steps at all. Used by `validate --strict`.
pub fn structural_warnings(scenarios: &[Scenario]) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.id.clone()) {
            warnings.push(format!("duplicate scenario id '{}'", scenario.id));
        }
        if scenario.steps.is_empty() {
            warnings.push(format!("scenario '{}' declares no steps", scenario.id));
        }
    }
    warnings
}
