//! create-pr-merge-commit CLI

mod cli;

use anstream::eprintln;
use anyhow::Context;
use clap::{ArgAction, Parser};
use cli::style::Stylize;
use pr_merge_commit::types::{DEFAULT_REMOTE, DEFAULT_TARGET_BRANCH};
use pr_merge_commit::workflow::WorkflowOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "create-pr-merge-commit")]
#[command(about = "Create a real merge commit for a squash-merged GitHub pull request")]
#[command(version)]
struct Cli {
    /// Number of the squash-merged pull request
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pr_number: u64,

    /// Path to the repository (defaults to current directory)
    #[arg(short = 'C', long, default_value = ".")]
    path: PathBuf,

    /// Remote to fetch from and to read owner/repo from
    #[arg(long, default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Branch the pull request was squash-merged into
    #[arg(long, default_value = DEFAULT_TARGET_BRANCH)]
    target: String,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".error());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let options = WorkflowOptions {
        pr_number: cli.pr_number,
        remote: cli.remote,
        target_branch: cli.target,
    };
    runtime.block_on(cli::run_create(&cli.path, options))?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise the flags pick the level for this crate only
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,pr_merge_commit={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
