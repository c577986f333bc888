use crate::constants::{
    DEFAULT_CRDS_SUBDIR, DEFAULT_DEPLOY_DIR, DEFAULT_INIT_TIMEOUT_SECS, DEFAULT_NAMESPACE,
    DEFAULT_PROXY_IMAGE,
};
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use serde_plain::derive_fromstr_from_deserialize;
use snafu::{ensure, ResultExt};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which family of checks a run executes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginType {
    /// Baseline operator conduct: status reporting, writable spec, etc.
    #[serde(alias = "basic-tests")]
    Basic,
    /// Packaging and metadata conformance for operator-lifecycle integration.
    #[serde(alias = "olm-tests", alias = "olm-integration")]
    Olm,
}

derive_fromstr_from_deserialize!(PluginType);

impl Default for PluginType {
    fn default() -> Self {
        Self::Basic
    }
}

impl Display for PluginType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginType::Basic => write!(f, "basic"),
            PluginType::Olm => write!(f, "olm"),
        }
    }
}

/// The image pull policy injected into the sidecar proxy container.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    Never,
    #[serde(alias = "PullIfNotPresent")]
    IfNotPresent,
}

derive_fromstr_from_deserialize!(PullPolicy);

impl Default for PullPolicy {
    fn default() -> Self {
        Self::Always
    }
}

impl PullPolicy {
    /// The value Kubernetes expects in a container's `imagePullPolicy`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::Never => "Never",
            PullPolicy::IfNotPresent => "IfNotPresent",
        }
    }
}

impl Display for PullPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `RunConfig` is the immutable input to one scorecard run. It can be deserialized from a YAML
/// config file like this:
///
/// ```yaml
/// namespace: my-ns
/// init-timeout: 120
/// cr-manifest:
///   - deploy/crds/cache_v1alpha1_memcached_cr.yaml
/// plugin: basic
/// selector: necessity=required
/// ```
///
/// Command line options are layered on top of the file by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct RunConfig {
    /// Namespace the operator and its CRs are created in.
    pub namespace: String,
    /// Path to a kubeconfig. `None` uses the default kube configuration.
    pub kubeconfig: Option<PathBuf>,
    /// CR manifests to test, in order.
    #[serde(rename = "cr-manifest")]
    pub cr_manifests: Vec<PathBuf>,
    /// Cluster-scoped resources. When absent, every CRD in `crds_dir` is combined.
    pub global_manifest: Option<PathBuf>,
    /// Namespaced resources. When absent, the standard files in `deploy_dir` are combined.
    pub namespaced_manifest: Option<PathBuf>,
    /// Directory containing the operator's CRD manifests.
    pub crds_dir: Option<PathBuf>,
    /// Directory containing the operator's deploy manifests.
    pub deploy_dir: PathBuf,
    /// ClusterServiceVersion manifest, required for OLM checks and pre-deployed runs.
    #[serde(rename = "csv-path")]
    pub csv_manifest: Option<PathBuf>,
    /// Operator bundle directory inspected by the OLM checks.
    pub bundle: Option<PathBuf>,
    pub proxy_image: String,
    pub proxy_pull_policy: PullPolicy,
    /// Seconds to wait for a CR to report a status.
    pub init_timeout: u64,
    #[serde(rename = "plugin")]
    pub plugin_type: PluginType,
    /// Label selector restricting which tests run.
    pub selector: String,
    /// The operator was already deployed by OLM; CRs come from the CSV.
    pub olm_deployed: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            kubeconfig: None,
            cr_manifests: Vec::new(),
            global_manifest: None,
            namespaced_manifest: None,
            crds_dir: None,
            deploy_dir: PathBuf::from(DEFAULT_DEPLOY_DIR),
            csv_manifest: None,
            bundle: None,
            proxy_image: DEFAULT_PROXY_IMAGE.to_string(),
            proxy_pull_policy: PullPolicy::default(),
            init_timeout: DEFAULT_INIT_TIMEOUT_SECS,
            plugin_type: PluginType::default(),
            selector: String::new(),
            olm_deployed: false,
        }
    }
}

impl RunConfig {
    /// Read a `RunConfig` from a YAML file. Keys that are not present keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).context(error::ConfigFileSnafu { path })?;
        Ok(serde_yaml::from_str(&contents).context(error::ConfigParseSnafu { path })?)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout)
    }

    /// The CRD directory, defaulting to `<deploy_dir>/crds`.
    pub fn crds_dir(&self) -> PathBuf {
        self.crds_dir
            .clone()
            .unwrap_or_else(|| self.deploy_dir.join(DEFAULT_CRDS_SUBDIR))
    }

    /// Whether a ClusterServiceVersion has to be read before the run starts.
    pub fn needs_csv(&self) -> bool {
        self.olm_deployed || self.plugin_type == PluginType::Olm
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.namespace.trim().is_empty(),
            error::InvalidConfigSnafu {
                reason: "namespace must not be empty"
            }
        );
        ensure!(
            self.olm_deployed || !self.cr_manifests.is_empty(),
            error::InvalidConfigSnafu {
                reason: "cr-manifest config option must be set"
            }
        );
        ensure!(
            !self.needs_csv() || self.csv_manifest.is_some(),
            error::InvalidConfigSnafu {
                reason: "csv-path must be set when running OLM tests or with olm-deployed"
            }
        );
        ensure!(
            self.init_timeout > 0,
            error::InvalidConfigSnafu {
                reason: "init-timeout must be greater than zero"
            }
        );
        Ok(())
    }
}
