//! The external CLI surface (§6): `run | watch | validate | list`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "attest", about = "Autonomous test-scenario orchestrator", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Runs scenarios to completion and reports a pass/fail exit code.
    Run(RunArgs),
    /// Runs scenarios once; file-watching re-runs are out of scope.
    Watch(RunArgs),
    /// Parses scenario files and reports which ones fail to load.
    Validate(ValidateArgs),
    /// Lists discovered scenarios.
    List(ListArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Run only the scenario with this id.
    #[arg(long)]
    pub scenario: Option<String>,

    /// Directory to scan for scenario files.
    #[arg(long, env = "AGENTIC_SCENARIO_DIR", default_value = "scenarios")]
    pub directory: PathBuf,

    /// Path to a JSON orchestrator configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides `execution.maxParallel`.
    #[arg(long, env = "AGENTIC_MAX_PARALLEL")]
    pub parallel: Option<usize>,

    /// Overrides `execution.defaultTimeout` in milliseconds.
    #[arg(long, env = "AGENTIC_TIMEOUT")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Directory to scan for scenario files.
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// A single scenario file to validate.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Also fail on structural warnings (duplicate ids, empty step lists).
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Directory to scan for scenario files.
    #[arg(long, default_value = "scenarios")]
    pub directory: PathBuf,

    /// Emits a JSON array of `{name, description, tags}` instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Only lists scenarios carrying this tag.
    #[arg(long)]
    pub filter: Option<String>,
}
