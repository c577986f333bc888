use crate::apply::apply;
use crate::context::{RunContext, Timing};
use crate::csv::{self, CrManifests};
use crate::duplicates::check_duplicates;
use crate::error::{self, Result};
use crate::manifests;
use crate::suites::{self, OlmInputs};
use crate::wait;
use futures::FutureExt;
use log::info;
use model::clients::ControlPlane;
use model::{AggregatedReport, ObjectRef, RunConfig, Selector, SuiteOutput};
use snafu::{OptionExt, ResultExt};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Runs a scorecard configuration against a cluster.
///
/// For every CR manifest the operator's resources and the CR are created, the CR is given time to
/// report a status, the configured suite is run against it and everything that was created is
/// deleted again. The first error aborts the run once the current CR has been cleaned up.
pub struct Scorecard {
    config: RunConfig,
    control_plane: Arc<dyn ControlPlane>,
    timing: Timing,
}

/// The manifests resolved before any CR is run.
struct Plan {
    global: Option<PathBuf>,
    namespaced: Option<PathBuf>,
    crs: Vec<PathBuf>,
    olm: OlmInputs,
    /// Keeps combined manifests on disk for the length of the run.
    _temp_files: Vec<NamedTempFile>,
    _cr_manifests: Option<CrManifests>,
}

impl Scorecard {
    pub fn new(config: RunConfig, control_plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            config,
            control_plane,
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Run the configured suite against every CR and collect the suite outputs in CR order.
    pub async fn run(&self) -> Result<AggregatedReport> {
        self.config.validate().context(error::ConfigSnafu)?;
        let selector = Selector::parse(&self.config.selector).context(error::ConfigSnafu)?;
        let mut ctx = RunContext::new(Arc::clone(&self.control_plane), &self.config.namespace)
            .with_timing(self.timing);

        let plan = self.plan(&mut ctx).await?;
        check_duplicates(ctx.log(), &plan.crs)?;

        let mut suites = Vec::with_capacity(plan.crs.len());
        for cr in &plan.crs {
            // Anything logged before this CR belongs to no suite.
            ctx.log().take();
            let outcome = AssertUnwindSafe(self.run_cr(&mut ctx, &plan, cr, &selector))
                .catch_unwind()
                .await;
            ctx.run_cleanup().await;
            ctx.reset_for_next_cr(self.config.olm_deployed);
            match outcome {
                Ok(Ok(suite)) => suites.push(suite),
                Ok(Err(e)) => return Err(e),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        info!("Ran {} suite(s)", suites.len());
        Ok(AggregatedReport::new(suites))
    }

    /// Resolve the CRs and the manifests to create for each of them.
    async fn plan(&self, ctx: &mut RunContext) -> Result<Plan> {
        let service_version = if self.config.needs_csv() {
            let path = self
                .config
                .csv_manifest
                .as_deref()
                .context(error::InvalidConfigSnafu {
                    reason: "csv-path must be set",
                })?;
            Some(Arc::new(csv::read_csv(ctx.log(), path)?))
        } else {
            None
        };
        let olm = OlmInputs {
            csv: service_version.clone(),
            crds_dir: self.config.crds_dir(),
            bundle: self.config.bundle.clone(),
        };

        if self.config.olm_deployed {
            let service_version =
                service_version
                    .as_deref()
                    .context(error::InvalidConfigSnafu {
                        reason: "a ClusterServiceVersion is required with olm-deployed",
                    })?;
            let deployment = csv::deployment_name(service_version)?;
            ctx.set_deployment_name(deployment);
            let pod = wait::wait_for_deployment_pod(
                ctx.control_plane().as_ref(),
                ctx.namespace(),
                deployment,
                self.timing.pod_timeout,
                self.timing.pod_poll_interval,
            )
            .await?;
            ctx.set_proxy_pod(pod);
            let cr_manifests =
                csv::crs_from_csv(ctx.log(), &self.config.cr_manifests, service_version)?;
            return Ok(Plan {
                global: None,
                namespaced: None,
                crs: cr_manifests.paths.clone(),
                olm,
                _temp_files: Vec::new(),
                _cr_manifests: Some(cr_manifests),
            });
        }

        let mut temp_files = Vec::new();
        let namespaced = match &self.config.namespaced_manifest {
            Some(path) => path.clone(),
            None => {
                let combined = manifests::combined_namespaced_manifest(&self.config.deploy_dir)?;
                let path = combined.path().to_path_buf();
                temp_files.push(combined);
                path
            }
        };
        let global = match &self.config.global_manifest {
            Some(path) => path.clone(),
            None => {
                let combined = manifests::combined_global_manifest(&self.config.crds_dir())?;
                let path = combined.path().to_path_buf();
                temp_files.push(combined);
                path
            }
        };
        Ok(Plan {
            global: Some(global),
            namespaced: Some(namespaced),
            crs: self.config.cr_manifests.clone(),
            olm,
            _temp_files: temp_files,
            _cr_manifests: None,
        })
    }

    async fn run_cr(
        &self,
        ctx: &mut RunContext,
        plan: &Plan,
        cr_path: &Path,
        selector: &Selector,
    ) -> Result<SuiteOutput> {
        ctx.log()
            .info(format!("Running for cr: {}", cr_path.display()));
        let image = self.config.proxy_image.as_str();
        let pull_policy = self.config.proxy_pull_policy;

        if let Some(global) = &plan.global {
            apply(ctx, global, image, pull_policy)
                .await
                .context(error::ProvisionSnafu {
                    what: "global resources",
                })?;
        }
        if let Some(namespaced) = &plan.namespaced {
            apply(ctx, namespaced, image, pull_policy)
                .await
                .context(error::ProvisionSnafu {
                    what: "namespaced resources",
                })?;
        }
        apply(ctx, cr_path, image, pull_policy)
            .await
            .context(error::ProvisionSnafu {
                what: "cr resource",
            })?;

        let mut cr = manifests::read_cr(cr_path)?;
        cr.metadata.namespace = Some(ctx.namespace().to_string());
        let object =
            ObjectRef::from_object(&cr).context(error::DecodeObjectSnafu { path: cr_path })?;
        ctx.log()
            .debug(format!("Waiting for {} to report a status", object));
        wait::poll_for_status(
            ctx.control_plane().as_ref(),
            self.config.init_timeout(),
            self.timing.status_poll_interval,
            &object,
        )
        .await?;

        Ok(suites::dispatch(self.config.plugin_type, ctx, cr, &plan.olm, selector).await)
    }
}

/// Describe the tests a run with `config` would execute, without touching the cluster.
pub fn list(config: &RunConfig) -> Result<AggregatedReport> {
    let selector = Selector::parse(&config.selector).context(error::ConfigSnafu)?;
    Ok(AggregatedReport::new(vec![suites::list(
        config.plugin_type,
        &selector,
    )]))
}
