/*!

This is the command line interface for running the operator scorecard against a cluster and for
listing the tests it would run.

!*/

mod list;
mod options;
mod run;

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;

/// Score a Kubernetes operator by creating its resources and CRs and checking how it reacts.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// Path to the kubeconfig file. Also can be passed with the KUBECONFIG environment variable.
    #[clap(long = "kubeconfig")]
    kubeconfig: Option<PathBuf>,
    /// Path to a scorecard configuration file. Defaults to `.osdk-scorecard.yaml` when present.
    #[clap(long = "config")]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Run the scorecard tests against the operator.
    Run(run::Run),
    /// List the tests that would run, without contacting the cluster.
    List(list::List),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the run completed but not every test passed.
async fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Run(run) => run.run(args.config.as_deref(), args.kubeconfig).await,
        Command::List(list) => list.run(args.config.as_deref()).map(|_| true),
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use the level for the scorecard crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("scorecard_model"), level)
                .filter(Some("scorecard_plugins"), level)
                .init();
        }
    }
}
