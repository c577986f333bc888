use crate::error::{self, Result};
use crate::manifests;
use crate::run_log::RunLog;
use model::ClusterServiceVersion;
use snafu::{ensure, OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read and validate the ClusterServiceVersion at `path`. Validation errors fail the read,
/// warnings are logged.
pub fn read_csv(log: &RunLog, path: &Path) -> Result<ClusterServiceVersion> {
    let contents = manifests::read(path)?;
    let csv: ClusterServiceVersion =
        serde_yaml::from_str(&contents).context(error::DecodeSnafu { path })?;
    let validation = csv.validate();
    for warning in &validation.warnings {
        log.warn(format!("CSV '{}': {}", csv.name(), warning));
    }
    ensure!(
        validation.errors.is_empty(),
        error::CsvValidationSnafu {
            path,
            reason: validation.errors.join("; "),
        }
    );
    Ok(csv)
}

/// The operator deployment declared by the CSV's install strategy.
pub fn deployment_name(csv: &ClusterServiceVersion) -> Result<&str> {
    csv.deployment_name().context(error::InvalidConfigSnafu {
        reason: format!(
            "CSV '{}' does not declare a deployment install strategy",
            csv.name()
        ),
    })
}

/// The CR manifests to run against. The handle keeps a CR written from the CSV's examples alive.
#[derive(Debug, Default)]
pub struct CrManifests {
    pub paths: Vec<PathBuf>,
    _example: Option<NamedTempFile>,
}

/// Pick the CR to run against when the operator was deployed by OLM. Only one CR is supported in
/// that mode: the first of `current` if any were given, otherwise the first example CR in the
/// CSV's `alm-examples` annotation.
pub fn crs_from_csv(
    log: &RunLog,
    current: &[PathBuf],
    csv: &ClusterServiceVersion,
) -> Result<CrManifests> {
    if let Some(first) = current.first() {
        if current.len() > 1 {
            log.warn(format!(
                "Only one CR manifest is supported when the operator is deployed by OLM, \
                 using '{}'",
                first.display()
            ));
        }
        return Ok(CrManifests {
            paths: vec![first.clone()],
            _example: None,
        });
    }

    let examples = csv.alm_examples().context(error::InvalidConfigSnafu {
        reason: format!(
            "metadata.annotations['alm-examples'] in CSV {} not set",
            csv.name()
        ),
    })?;
    let crs: Vec<serde_json::Value> =
        serde_json::from_str(examples).context(error::AlmExamplesSnafu { csv: csv.name() })?;
    let first = crs.first().context(error::InvalidConfigSnafu {
        reason: format!(
            "metadata.annotations['alm-examples'] in CSV {} is empty",
            csv.name()
        ),
    })?;
    if crs.len() > 1 {
        log.warn(format!(
            "CSV {} declares {} example CRs, only the first is used",
            csv.name(),
            crs.len()
        ));
    }
    let yaml = serde_yaml::to_string(first).context(error::SerializeCrSnafu)?;
    let example = manifests::write_temp_manifest(&yaml)?;
    Ok(CrManifests {
        paths: vec![example.path().to_path_buf()],
        _example: Some(example),
    })
}
