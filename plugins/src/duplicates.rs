use crate::error::{self, Result};
use crate::manifests;
use crate::run_log::RunLog;
use model::Gvk;
use snafu::ResultExt;
use std::collections::HashSet;
use std::path::Path;

/// Warn about CR manifests that share a group/version/kind, since their results may interfere
/// with each other. Only `apiVersion` and `kind` are decoded. Returns how many duplicates were
/// seen; every occurrence after the first counts once.
pub fn check_duplicates<P>(log: &RunLog, paths: &[P]) -> Result<usize>
where
    P: AsRef<Path>,
{
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    for path in paths {
        let path = path.as_ref();
        for types in manifests::read_type_metas(path)? {
            let gvk = Gvk::from_type_meta(&types).context(error::DecodeObjectSnafu { path })?;
            if !seen.insert(gvk.clone()) {
                log.warn(format!(
                    "Duplicate gvks in CR list detected ({}); results may be inaccurate",
                    gvk
                ));
                duplicates += 1;
            }
        }
    }
    Ok(duplicates)
}
