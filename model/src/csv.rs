use crate::constants::{ALM_EXAMPLES_ANNOTATION, INSTALL_STRATEGY_DEPLOYMENT};
use crate::Gvk;
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// The subset of an operator-lifecycle `ClusterServiceVersion` that the scorecard reads: the
/// example CRs, the install strategy naming the operator deployment, and the owned CRD
/// descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersion {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CsvSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvSpec {
    pub install: Option<NamedInstallStrategy>,
    pub customresourcedefinitions: Option<CustomResourceDefinitions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedInstallStrategy {
    #[serde(default)]
    pub strategy: String,
    pub spec: Option<StrategyDetailsDeployment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDetailsDeployment {
    #[serde(default)]
    pub deployments: Vec<StrategyDeploymentSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDeploymentSpec {
    pub name: String,
    #[serde(default)]
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinitions {
    #[serde(default)]
    pub owned: Vec<CrdDescription>,
    #[serde(default)]
    pub required: Vec<CrdDescription>,
}

/// Describes one CRD the operator owns or requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdDescription {
    /// `<plural>.<group>`
    pub name: String,
    pub version: String,
    pub kind: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub resources: Vec<ApiResourceReference>,
    #[serde(default)]
    pub spec_descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub status_descriptors: Vec<Descriptor>,
}

impl CrdDescription {
    /// The API group, taken from the `<plural>.<group>` name.
    pub fn group(&self) -> &str {
        self.name
            .split_once('.')
            .map(|(_, group)| group)
            .unwrap_or_default()
    }

    pub fn describes(&self, gvk: &Gvk) -> bool {
        self.kind == gvk.kind && self.version == gvk.version && self.group() == gvk.group
    }

    pub fn has_spec_descriptor(&self, path: &str) -> bool {
        self.spec_descriptors.iter().any(|d| d.path == path)
    }

    pub fn has_status_descriptor(&self, path: &str) -> bool {
        self.status_descriptors.iter().any(|d| d.path == path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceReference {
    pub name: Option<String>,
    pub kind: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub path: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(default, rename = "x-descriptors")]
    pub x_descriptors: Vec<String>,
}

/// Problems found while validating a `ClusterServiceVersion`. Errors make the CSV unusable,
/// warnings are only reported.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CsvValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ClusterServiceVersion {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// The raw JSON array of example CRs, if the CSV carries one.
    pub fn alm_examples(&self) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(ALM_EXAMPLES_ANNOTATION))
            .map(String::as_str)
    }

    /// The deployment install strategy, if that is the strategy in use.
    pub fn deployment_strategy(&self) -> Option<&StrategyDetailsDeployment> {
        self.spec
            .install
            .as_ref()
            .filter(|install| install.strategy == INSTALL_STRATEGY_DEPLOYMENT)
            .and_then(|install| install.spec.as_ref())
    }

    /// Name of the first deployment of the install strategy: the operator deployment.
    pub fn deployment_name(&self) -> Option<&str> {
        self.deployment_strategy()
            .and_then(|strategy| strategy.deployments.first())
            .map(|deployment| deployment.name.as_str())
    }

    pub fn owned_crds(&self) -> &[CrdDescription] {
        self.spec
            .customresourcedefinitions
            .as_ref()
            .map(|crds| crds.owned.as_slice())
            .unwrap_or_default()
    }

    /// The owned CRD description that covers objects of type `gvk`.
    pub fn owned_crd(&self, gvk: &Gvk) -> Option<&CrdDescription> {
        self.owned_crds().iter().find(|crd| crd.describes(gvk))
    }

    pub fn validate(&self) -> CsvValidation {
        let mut validation = CsvValidation::default();
        if self.kind != "ClusterServiceVersion" {
            validation
                .errors
                .push(format!("expected kind ClusterServiceVersion, got '{}'", self.kind));
        }
        if self.name().is_empty() {
            validation.errors.push("metadata.name is empty".to_string());
        }
        match &self.spec.install {
            None => validation
                .errors
                .push("spec.install is missing".to_string()),
            Some(install) if install.strategy != INSTALL_STRATEGY_DEPLOYMENT => {
                validation.errors.push(format!(
                    "unsupported install strategy '{}', expected '{}'",
                    install.strategy, INSTALL_STRATEGY_DEPLOYMENT
                ))
            }
            Some(_) if self.deployment_name().is_none() => validation
                .errors
                .push("install strategy declares no deployments".to_string()),
            Some(_) => {}
        }
        if self.alm_examples().is_none() {
            validation.warnings.push(format!(
                "metadata.annotations['{}'] is missing",
                ALM_EXAMPLES_ANNOTATION
            ));
        }
        for crd in self.owned_crds() {
            if crd.group().is_empty() {
                validation.errors.push(format!(
                    "owned CRD name '{}' is not of the form <plural>.<group>",
                    crd.name
                ));
            }
        }
        validation
    }
}
