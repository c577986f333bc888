use crate::options::RunOptions;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use model::clients::KubeControlPlane;
use model::AggregatedReport;
use plugins::Scorecard;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use terminal_size::{Height, Width};

/// Run the scorecard tests against the operator.
#[derive(Debug, Parser)]
pub(crate) struct Run {
    #[clap(flatten)]
    pub(crate) options: RunOptions,

    /// Output the results in JSON format.
    #[clap(long = "json")]
    pub(crate) json: bool,
}

impl Run {
    /// Returns whether every test passed.
    pub(crate) async fn run(
        self,
        config_file: Option<&Path>,
        kubeconfig: Option<PathBuf>,
    ) -> Result<bool> {
        let config = self.options.load(config_file)?;
        config.validate().context("Invalid scorecard configuration")?;

        let control_plane = match kubeconfig.or_else(|| config.kubeconfig.clone()) {
            Some(path) => KubeControlPlane::new_from_kubeconfig_path(&path)
                .await
                .context(format!(
                    "Unable to create scorecard client from path '{:?}'",
                    path
                ))?,
            None => KubeControlPlane::new()
                .await
                .context("Unable to create default scorecard client")?,
        };

        info!("Running the {} tests", config.plugin_type);
        let report = Scorecard::new(config, Arc::new(control_plane))
            .run()
            .await
            .context("Scorecard run failed")?;
        print_report(&report, self.json)?;
        Ok(report.all_passed())
    }
}

pub(crate) fn print_report(report: &AggregatedReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            report
                .to_json()
                .context("Could not create string from report.")?
        );
    } else {
        let (terminal_size::Width(width), _) =
            terminal_size::terminal_size().unwrap_or((Width(120), Height(0)));
        println!("{}", report.to_table_string(width as usize));
    }
    Ok(())
}
