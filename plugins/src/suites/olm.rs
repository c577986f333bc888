use super::{live, Check, TestSuite};
use crate::manifests;
use crate::run_log::RunLog;
use async_trait::async_trait;
use kube::core::DynamicObject;
use model::clients::ControlPlane;
use model::constants::{NECESSITY_RECOMMENDED, NECESSITY_REQUIRED};
use model::{ClusterServiceVersion, CrdDescription, Gvk, SuiteName, Test, TestResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct OlmTestConfig {
    pub control_plane: Arc<dyn ControlPlane>,
    pub cr: DynamicObject,
    pub csv: Option<Arc<ClusterServiceVersion>>,
    pub crds_dir: PathBuf,
    pub bundle: Option<PathBuf>,
}

impl OlmTestConfig {
    /// The CR's type and the CSV entry describing it. Problems are recorded in `result`.
    fn owned_crd(&self, result: &mut TestResult) -> Option<(Gvk, &CrdDescription)> {
        let gvk = match Gvk::of(&self.cr) {
            Ok(gvk) => gvk,
            Err(e) => {
                result.error(e.to_string());
                return None;
            }
        };
        let csv = match &self.csv {
            Some(csv) => csv,
            None => {
                result.error("no ClusterServiceVersion was provided");
                return None;
            }
        };
        match csv.owned_crd(&gvk) {
            Some(crd) => Some((gvk, crd)),
            None => {
                result.fail(format!(
                    "Add {} to the owned CRDs of CSV {}",
                    gvk,
                    csv.name()
                ));
                None
            }
        }
    }
}

pub fn olm_suite() -> TestSuite<OlmTestConfig> {
    TestSuite::new(SuiteName::Olm)
        .with_check(BundleValidation::default())
        .with_check(CrdsHaveValidation::default())
        .with_check(CrdsHaveResources::default())
        .with_check(SpecDescriptors::default())
        .with_check(StatusDescriptors::default())
}

/// The top level keys of a block such as `spec` or `status`.
fn keys(block: Option<&Value>) -> Vec<String> {
    block
        .and_then(Value::as_object)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

struct BundleValidation(Test);

impl Default for BundleValidation {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Olm,
            "bundlevalidation",
            "Validates bundle contents",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<OlmTestConfig> for BundleValidation {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &OlmTestConfig, result: &mut TestResult, _: &RunLog) {
        let bundle = match &config.bundle {
            Some(bundle) => bundle,
            None => {
                result.error("no bundle directory was provided");
                return;
            }
        };
        if !bundle.is_dir() {
            result.fail(format!("Bundle directory '{}' does not exist", bundle.display()));
            return;
        }
        let manifests_dir = bundle.join("manifests");
        match manifests::yaml_files(&manifests_dir) {
            Ok(files) if files.iter().any(|file| declares_csv(file)) => {}
            Ok(_) => result.fail(format!(
                "Add a ClusterServiceVersion manifest to '{}'",
                manifests_dir.display()
            )),
            Err(e) => result.fail(format!("Add a 'manifests' directory to the bundle: {}", e)),
        }
        let annotations = bundle.join("metadata").join("annotations.yaml");
        match manifests::read_documents(&annotations) {
            Ok(documents)
                if documents
                    .first()
                    .and_then(|document| document.get("annotations"))
                    .map_or(false, serde_yaml::Value::is_mapping) => {}
            Ok(_) => result.fail(format!(
                "Add an 'annotations' map to '{}'",
                annotations.display()
            )),
            Err(e) => result.fail(format!("Add bundle metadata: {}", e)),
        }
    }
}

fn declares_csv(path: &Path) -> bool {
    manifests::read_type_metas(path)
        .map(|types| types.iter().any(|t| t.kind == "ClusterServiceVersion"))
        .unwrap_or(false)
}

struct CrdsHaveValidation(Test);

impl Default for CrdsHaveValidation {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Olm,
            "crdshavevalidation",
            "All CRDs have an OpenAPI validation subsection",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<OlmTestConfig> for CrdsHaveValidation {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &OlmTestConfig, result: &mut TestResult, _: &RunLog) {
        let gvk = match Gvk::of(&config.cr) {
            Ok(gvk) => gvk,
            Err(e) => return result.error(e.to_string()),
        };
        let crd = match find_crd(&config.crds_dir, &gvk) {
            Ok(Some(crd)) => crd,
            Ok(None) => {
                return result.error(format!(
                    "no CRD for {} found in '{}'",
                    gvk,
                    config.crds_dir.display()
                ))
            }
            Err(e) => return result.error(e),
        };
        let schema = match openapi_schema(&crd, &gvk.version) {
            Some(schema) => schema,
            None => {
                return result.fail(format!(
                    "Add CRD validation for {}/{}",
                    gvk.kind, gvk.version
                ))
            }
        };
        let properties = schema.pointer("/properties/spec/properties");
        for key in keys(config.cr.data.get("spec")) {
            if properties.and_then(|p| p.get(&key)).is_none() {
                result.fail(format!(
                    "Add CRD validation for spec field '{}' in {}/{}",
                    key, gvk.kind, gvk.version
                ));
            }
        }
    }
}

/// The CRD manifest in `dir` that defines objects of `gvk`, as JSON.
fn find_crd(dir: &Path, gvk: &Gvk) -> Result<Option<Value>, String> {
    let files = manifests::yaml_files(dir).map_err(|e| e.to_string())?;
    for file in files {
        let documents = manifests::read_documents(&file).map_err(|e| e.to_string())?;
        for document in documents {
            let crd: Value = match serde_json::to_value(&document) {
                Ok(crd) => crd,
                Err(_) => continue,
            };
            let field = |pointer: &str| crd.pointer(pointer).and_then(Value::as_str);
            let defines = field("/kind") == Some("CustomResourceDefinition")
                && field("/spec/group") == Some(gvk.group.as_str())
                && field("/spec/names/kind") == Some(gvk.kind.as_str());
            if defines {
                return Ok(Some(crd));
            }
        }
    }
    Ok(None)
}

/// The OpenAPI v3 schema a CRD declares for `version`, per version or CRD-wide.
fn openapi_schema<'a>(crd: &'a Value, version: &str) -> Option<&'a Value> {
    let per_version = crd
        .pointer("/spec/versions")
        .and_then(Value::as_array)
        .and_then(|versions| {
            versions
                .iter()
                .find(|v| v.get("name").and_then(Value::as_str) == Some(version))
        })
        .and_then(|v| v.pointer("/schema/openAPIV3Schema"));
    per_version.or_else(|| crd.pointer("/spec/validation/openAPIV3Schema"))
}

struct CrdsHaveResources(Test);

impl Default for CrdsHaveResources {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Olm,
            "crdshaveresources",
            "All Owned CRDs contain a resources subsection",
            NECESSITY_RECOMMENDED,
        ))
    }
}

#[async_trait]
impl Check<OlmTestConfig> for CrdsHaveResources {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &OlmTestConfig, result: &mut TestResult, _: &RunLog) {
        if let Some((_, crd)) = config.owned_crd(result) {
            if crd.resources.is_empty() {
                result.fail(format!(
                    "If it would be helpful to an end-user to understand or troubleshoot your \
                     CR, consider adding resources to the resources section for owned CRD {}",
                    crd.name
                ));
            }
        }
    }
}

struct SpecDescriptors(Test);

impl Default for SpecDescriptors {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Olm,
            "specdescriptors",
            "All spec fields have matching descriptors in the CSV",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<OlmTestConfig> for SpecDescriptors {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &OlmTestConfig, result: &mut TestResult, _: &RunLog) {
        let crd = match config.owned_crd(result) {
            Some((_, crd)) => crd,
            None => return,
        };
        let spec = config.cr.data.get("spec");
        if spec.is_none() {
            return result.fail("Add a 'spec' field to your Custom Resource");
        }
        for key in keys(spec) {
            if !crd.has_spec_descriptor(&key) {
                result.fail(format!("Add a spec descriptor for {}", key));
            }
        }
    }
}

struct StatusDescriptors(Test);

impl Default for StatusDescriptors {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Olm,
            "statusdescriptors",
            "All status fields have matching descriptors in the CSV",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<OlmTestConfig> for StatusDescriptors {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &OlmTestConfig, result: &mut TestResult, _: &RunLog) {
        let crd = match config.owned_crd(result) {
            Some((_, crd)) => crd,
            None => return,
        };
        let current = match live(config.control_plane.as_ref(), &config.cr).await {
            Ok(current) => current,
            Err(e) => return result.error(e),
        };
        let status = current.data.get("status");
        if status.is_none() {
            return result.fail("Add a 'status' field to your Custom Resource");
        }
        for key in keys(status) {
            if !crd.has_status_descriptor(&key) {
                result.fail(format!("Add a status descriptor for {}", key));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_lookup() {
        let v1 = json!({
            "spec": { "versions": [
                { "name": "v1alpha1", "schema": { "openAPIV3Schema": { "type": "object" } } },
                { "name": "v1alpha2" }
            ]}
        });
        assert!(openapi_schema(&v1, "v1alpha1").is_some());
        assert!(openapi_schema(&v1, "v1alpha2").is_none());

        let v1beta1 = json!({
            "spec": { "validation": { "openAPIV3Schema": { "type": "object" } } }
        });
        assert!(openapi_schema(&v1beta1, "v1alpha2").is_some());
    }

    #[test]
    fn top_level_keys() {
        let spec = json!({ "size": 3, "image": "memcached" });
        let mut found = keys(Some(&spec));
        found.sort();
        assert_eq!(found, vec!["image", "size"]);
        assert!(keys(None).is_empty());
        assert!(keys(Some(&json!("scalar"))).is_empty());
    }
}
