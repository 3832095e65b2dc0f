//! Entry point for the `attest` binary (§6 external CLI surface).
//!
//! `init_tracing` builds a `WARN`-default `EnvFilter` piped into a compact
//! `fmt` subscriber, extended to also honour the named `AGENTIC_LOG_LEVEL`
//! variable so the binary doesn't require `RUST_LOG` to change verbosity.

mod cli;
mod commands;
mod config;
mod loader;
mod report;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let default_directive = std::env::var("AGENTIC_LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::WARN);

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_directive.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

async fn dispatch(cli: Cli) -> Result<u8> {
    match cli.command {
        Command::Run(args) => commands::run(args).await,
        Command::Watch(args) => commands::run(args).await,
        Command::Validate(args) => commands::validate(args),
        Command::List(args) => commands::list(args),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let code = dispatch(cli).await?;
    Ok(ExitCode::from(code))
}
