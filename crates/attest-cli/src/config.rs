//! Resolves run settings from, in increasing precedence: the built-in
//! default, an optional `--config` JSON file, `AGENTIC_*` environment
//! variables (§6), then the matching CLI flag.
//!
//! The config file's top-level shape mirrors `OrchestratorConfig`
//! (`execution`, `triage`, `issueReporter`, `issuePriorityThreshold`) plus
//! the CLI-only `reportDirectory` field, so one `--config` file configures
//! both the scheduler and the automatic triage/issue-reporter forwarding
//! it drives.

use std::path::Path;

use anyhow::{Context, Result};
use attest_orchestrator::OrchestratorConfig;
use serde::Deserialize;

fn default_report_directory() -> String {
    "reports".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(flatten)]
    orchestrator: OrchestratorConfig,
    #[serde(default = "default_report_directory")]
    report_directory: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self { orchestrator: OrchestratorConfig::default(), report_directory: default_report_directory() }
    }
}

pub struct ResolvedConfig {
    pub orchestrator: OrchestratorConfig,
    pub report_directory: String,
}

pub fn load_execution_config(
    config_path: Option<&Path>,
    parallel_flag: Option<usize>,
    timeout_flag: Option<u64>,
) -> Result<ResolvedConfig> {
    let file = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str::<ConfigFile>(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => ConfigFile::default(),
    };
    let mut orchestrator = file.orchestrator;

    if let Ok(value) = std::env::var("AGENTIC_MAX_PARALLEL") {
        if let Ok(parsed) = value.parse() {
            orchestrator.execution.max_parallel = parsed;
        }
    }
    if let Ok(value) = std::env::var("AGENTIC_TIMEOUT") {
        if let Ok(parsed) = value.parse() {
            orchestrator.execution.default_timeout_ms = parsed;
        }
    }

    if let Some(parallel) = parallel_flag {
        orchestrator.execution.max_parallel = parallel;
    }
    if let Some(timeout) = timeout_flag {
        orchestrator.execution.default_timeout_ms = timeout;
    }

    Ok(ResolvedConfig { orchestrator, report_directory: file.report_directory })
}
