use crate::error::{self, Result};
use kube::core::{DynamicObject, TypeMeta};
use log::{debug, warn};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Files of the operator deployment directory that make up the namespaced manifest, in the order
/// they are applied.
const NAMESPACED_MANIFEST_FILES: &[&str] = &[
    "service_account.yaml",
    "role.yaml",
    "role_binding.yaml",
    "operator.yaml",
];

pub(crate) fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).context(error::FileSnafu { path })
}

/// Split a multi-document YAML file into its documents. Empty documents are skipped.
pub fn read_documents(path: &Path) -> Result<Vec<serde_yaml::Value>> {
    let contents = read(path)?;
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&contents) {
        let value = serde_yaml::Value::deserialize(document).context(error::DecodeSnafu { path })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Decode every document of a manifest into an object. Each must carry `apiVersion` and `kind`.
pub fn read_objects(path: &Path) -> Result<Vec<DynamicObject>> {
    read_documents(path)?
        .into_iter()
        .map(|document| {
            let object: DynamicObject =
                serde_yaml::from_value(document).context(error::DecodeSnafu { path })?;
            model::Gvk::of(&object).context(error::DecodeObjectSnafu { path })?;
            Ok(object)
        })
        .collect()
}

/// Decode only `apiVersion` and `kind` of every document in a manifest.
pub fn read_type_metas(path: &Path) -> Result<Vec<TypeMeta>> {
    read_documents(path)?
        .into_iter()
        .map(|document| serde_yaml::from_value(document).context(error::DecodeSnafu { path }))
        .collect()
}

/// The first object of a CR manifest: the CR the suites are run against.
pub fn read_cr(path: &Path) -> Result<DynamicObject> {
    read_objects(path)?
        .into_iter()
        .next()
        .context(error::EmptyManifestSnafu { path })
}

/// Write `contents` to a temporary YAML file that is removed when the handle is dropped.
pub fn write_temp_manifest(contents: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("scorecard-")
        .suffix(".yaml")
        .tempfile()
        .context(error::TempFileSnafu)?;
    file.write_all(contents.as_bytes())
        .context(error::TempFileSnafu)?;
    file.flush().context(error::TempFileSnafu)?;
    Ok(file)
}

/// Concatenate `paths` into one multi-document YAML string.
fn combine(paths: &[PathBuf]) -> Result<String> {
    let mut combined = String::new();
    for path in paths {
        let contents = read(path)?;
        if !combined.is_empty() {
            combined.push_str("\n---\n");
        }
        combined.push_str(contents.trim_start_matches("---\n").trim_end());
        combined.push('\n');
    }
    Ok(combined)
}

/// Combine the operator's service account, role, role binding and deployment found in
/// `deploy_dir` into a single temporary manifest. Missing files are skipped.
pub fn combined_namespaced_manifest(deploy_dir: &Path) -> Result<NamedTempFile> {
    let paths: Vec<PathBuf> = NAMESPACED_MANIFEST_FILES
        .iter()
        .map(|file| deploy_dir.join(file))
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                debug!("'{}' not found, not adding it", path.display());
            }
            exists
        })
        .collect();
    if paths.is_empty() {
        warn!(
            "No namespaced resources found in '{}'",
            deploy_dir.display()
        );
    }
    write_temp_manifest(&combine(&paths)?)
}

/// Combine every CRD manifest in `crds_dir` into a single temporary manifest.
pub fn combined_global_manifest(crds_dir: &Path) -> Result<NamedTempFile> {
    let mut paths = Vec::new();
    for path in yaml_files(crds_dir)? {
        let is_crd = read_type_metas(&path)?
            .iter()
            .any(|types| types.kind == "CustomResourceDefinition");
        if is_crd {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        warn!("No CRDs found in '{}'", crds_dir.display());
    }
    write_temp_manifest(&combine(&paths)?)
}

/// The `.yaml` and `.yml` files directly inside `dir`, sorted by name.
pub(crate) fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).context(error::FileSnafu { path: dir })? {
        let path = entry.context(error::FileSnafu { path: dir })?.path();
        let is_yaml = matches!(
            path.extension().and_then(|extension| extension.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
"#;

    #[test]
    fn empty_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multi.yaml");
        fs::write(
            &path,
            "---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n---\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: b\n",
        )
        .unwrap();
        let objects = read_objects(&path).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].metadata.name.as_deref(), Some("b"));
    }

    #[test]
    fn objects_need_a_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "metadata:\n  name: a\n").unwrap();
        assert!(read_objects(&path).is_err());
    }

    #[test]
    fn combine_deploy_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("role.yaml"),
            "apiVersion: rbac.authorization.k8s.io/v1\nkind: Role\nmetadata:\n  name: r\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("operator.yaml"),
            "---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: op\n",
        )
        .unwrap();
        let combined = combined_namespaced_manifest(dir.path()).unwrap();
        let kinds: Vec<String> = read_type_metas(combined.path())
            .unwrap()
            .into_iter()
            .map(|types| types.kind)
            .collect();
        assert_eq!(kinds, vec!["Role", "Deployment"]);
    }

    #[test]
    fn combine_crds_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("widget_crd.yaml"), CRD).unwrap();
        fs::write(
            dir.path().join("widget_cr.yaml"),
            "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: w\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not yaml").unwrap();
        let combined = combined_global_manifest(dir.path()).unwrap();
        let objects = read_objects(combined.path()).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].metadata.name.as_deref(),
            Some("widgets.example.com")
        );
    }
}
