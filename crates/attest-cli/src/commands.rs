//! One function per subcommand (§6), each returning the process exit code
//! its contract specifies.

use std::path::Path;

use anyhow::Result;
use attest_core::model::Scenario;
use attest_orchestrator::Orchestrator;

use crate::cli::{ListArgs, RunArgs, ValidateArgs};
use crate::config::load_execution_config;
use crate::loader::{load_directory, load_scenario_file, structural_warnings};
use crate::report::write_session_report;

fn select_scenario<'a>(scenarios: &'a [Scenario], id: &str) -> Option<&'a Scenario> {
    scenarios.iter().find(|scenario| scenario.id == id)
}

pub async fn run(args: RunArgs) -> Result<u8> {
    let resolved = load_execution_config(args.config.as_deref(), args.parallel, args.timeout)?;
    let outcome = load_directory(&args.directory)?;
    for error in &outcome.errors {
        tracing::warn!(path = %error.path.display(), message = %error.message, "scenario file failed to load");
    }

    let scenarios = match &args.scenario {
        Some(id) => match select_scenario(&outcome.scenarios, id) {
            Some(scenario) => vec![scenario.clone()],
            None => {
                tracing::error!(scenario = %id, "no scenario with this id was found");
                return Ok(1);
            }
        },
        None => outcome.scenarios,
    };

    if scenarios.is_empty() {
        tracing::warn!("no scenarios to run");
        return Ok(0);
    }

    let orchestrator = Orchestrator::new(resolved.orchestrator);
    let session = orchestrator.run(scenarios).await;

    if let Err(error) = write_session_report(Path::new(&resolved.report_directory), &session) {
        tracing::warn!(%error, "failed to persist session report");
    }

    tracing::info!(
        total = session.summary.total,
        passed = session.summary.passed,
        failed = session.summary.failed,
        error = session.summary.error,
        skipped = session.summary.skipped,
        "session finished"
    );

    Ok(if session.summary.failed == 0 && session.summary.error == 0 { 0 } else { 1 })
}

pub fn validate(args: ValidateArgs) -> Result<u8> {
    let mut scenarios = Vec::new();
    let mut had_error = false;

    if let Some(file) = &args.file {
        match load_scenario_file(file) {
            Ok(scenario) => scenarios.push(scenario),
            Err(message) => {
                tracing::error!(path = %file.display(), %message, "scenario file failed to parse");
                had_error = true;
            }
        }
    }

    if let Some(directory) = &args.directory {
        let outcome = load_directory(directory)?;
        for error in &outcome.errors {
            tracing::error!(path = %error.path.display(), message = %error.message, "scenario file failed to parse");
            had_error = true;
        }
        scenarios.extend(outcome.scenarios);
    }

    if args.strict {
        for warning in structural_warnings(&scenarios) {
            tracing::warn!(%warning, "strict validation warning");
            had_error = true;
        }
    }

    Ok(if had_error { 1 } else { 0 })
}

pub fn list(args: ListArgs) -> Result<u8> {
    let outcome = load_directory(&args.directory)?;
    for error in &outcome.errors {
        tracing::warn!(path = %error.path.display(), message = %error.message, "scenario file failed to load");
    }

    let filtered: Vec<&Scenario> = outcome
        .scenarios
        .iter()
        .filter(|scenario| match &args.filter {
            Some(tag) => scenario.tags.contains(tag),
            None => true,
        })
        .collect();

    if args.json {
        let payload: Vec<_> = filtered
            .iter()
            .map(|scenario| {
                serde_json::json!({
                    "name": scenario.name,
                    "description": scenario.description,
                    "tags": scenario.tags,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for scenario in filtered {
            println!("{} - {}", scenario.name, scenario.description);
        }
    }

    Ok(0)
}
