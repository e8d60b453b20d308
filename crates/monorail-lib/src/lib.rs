//! Library behind the `monorail` binary: CLI surface, task engine, and the
//! subprocess runner that executes workspace scripts.

pub mod cli;
pub mod engine;
pub mod process;
pub mod run;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Entry point shared with the thin binary crate: parse arguments, install
/// the subscriber, bring up the runtime, and map the run outcome to an
/// exit status.
pub fn main() -> ExitCode {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("monorail: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let cli::Command::Run { task, to } = args.command;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match runtime.block_on(run::run(&cwd, &task, to.as_deref())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("monorail: {:#}", anyhow::Error::new(err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
