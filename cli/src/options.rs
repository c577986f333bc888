use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use model::constants::DEFAULT_CONFIG_FILE;
use model::{PluginType, PullPolicy, RunConfig};
use std::path::{Path, PathBuf};

/// Options shared by `run` and `list`. Each one overrides the value from the configuration file.
#[derive(Debug, Default, Parser)]
pub(crate) struct RunOptions {
    /// Namespace to create the operator's resources and CRs in.
    #[clap(long, short = 'n')]
    pub(crate) namespace: Option<String>,
    /// Path to a CR manifest. Can be given more than once; every CR gets its own suite run.
    #[clap(long = "cr-manifest")]
    pub(crate) cr_manifests: Vec<PathBuf>,
    /// Path to a manifest of cluster-scoped resources such as CRDs.
    #[clap(long)]
    pub(crate) global_manifest: Option<PathBuf>,
    /// Path to a manifest of the operator's namespaced resources.
    #[clap(long)]
    pub(crate) namespaced_manifest: Option<PathBuf>,
    /// Directory holding the operator's CRD manifests. Defaults to `<deploy-dir>/crds`.
    #[clap(long)]
    pub(crate) crds_dir: Option<PathBuf>,
    /// Directory holding the operator's deployment manifests.
    #[clap(long)]
    pub(crate) deploy_dir: Option<PathBuf>,
    /// Path to the operator's ClusterServiceVersion.
    #[clap(long = "csv-path")]
    pub(crate) csv_path: Option<PathBuf>,
    /// Path to the operator bundle directory.
    #[clap(long)]
    pub(crate) bundle: Option<PathBuf>,
    /// Image of the proxy sidecar that records the operator's API requests.
    #[clap(long)]
    pub(crate) proxy_image: Option<String>,
    /// Pull policy of the proxy sidecar [Always|Never|IfNotPresent].
    #[clap(long)]
    pub(crate) proxy_pull_policy: Option<PullPolicy>,
    /// Seconds to wait for each CR to report a status.
    #[clap(long)]
    pub(crate) init_timeout: Option<u64>,
    /// The suite to run [basic|olm].
    #[clap(long)]
    pub(crate) plugin: Option<PluginType>,
    /// Label selector narrowing down the tests to run, e.g. `necessity=required`.
    #[clap(long)]
    pub(crate) selector: Option<String>,
    /// The operator was deployed by OLM; take the CR from the CSV's examples.
    #[clap(long)]
    pub(crate) olm_deployed: bool,
}

impl RunOptions {
    /// Read the configuration file, if any, and apply the command line overrides.
    pub(crate) fn load(&self, config_file: Option<&Path>) -> Result<RunConfig> {
        let mut config = read_config(config_file)?;
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if !self.cr_manifests.is_empty() {
            config.cr_manifests = self.cr_manifests.clone();
        }
        override_path(&mut config.global_manifest, &self.global_manifest);
        override_path(&mut config.namespaced_manifest, &self.namespaced_manifest);
        override_path(&mut config.crds_dir, &self.crds_dir);
        override_path(&mut config.csv_manifest, &self.csv_path);
        override_path(&mut config.bundle, &self.bundle);
        if let Some(deploy_dir) = &self.deploy_dir {
            config.deploy_dir = deploy_dir.clone();
        }
        if let Some(proxy_image) = &self.proxy_image {
            config.proxy_image = proxy_image.clone();
        }
        if let Some(pull_policy) = self.proxy_pull_policy {
            config.proxy_pull_policy = pull_policy;
        }
        if let Some(init_timeout) = self.init_timeout {
            config.init_timeout = init_timeout;
        }
        if let Some(plugin) = self.plugin {
            config.plugin_type = plugin;
        }
        if let Some(selector) = &self.selector {
            config.selector = selector.clone();
        }
        config.olm_deployed |= self.olm_deployed;
        Ok(config)
    }
}

fn override_path(value: &mut Option<PathBuf>, flag: &Option<PathBuf>) {
    if flag.is_some() {
        *value = flag.clone();
    }
}

fn read_config(config_file: Option<&Path>) -> Result<RunConfig> {
    let path = match config_file {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => {
            debug!("No configuration file, using defaults");
            return Ok(RunConfig::default());
        }
    };
    debug!("Reading configuration from '{}'", path.display());
    RunConfig::from_path(path)
        .context(format!("Unable to read configuration '{}'", path.display()))
}
