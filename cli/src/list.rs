use crate::options::RunOptions;
use crate::run::print_report;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

/// List the tests that would run, without contacting the cluster.
#[derive(Debug, Parser)]
pub(crate) struct List {
    #[clap(flatten)]
    pub(crate) options: RunOptions,

    /// Output the tests in JSON format.
    #[clap(long = "json")]
    pub(crate) json: bool,
}

impl List {
    pub(crate) fn run(self, config_file: Option<&Path>) -> Result<()> {
        let config = self.options.load(config_file)?;
        let report = plugins::list(&config).context("Unable to list the scorecard tests")?;
        print_report(&report, self.json)
    }
}
