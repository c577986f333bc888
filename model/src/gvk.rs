use crate::error::{self, Result};
use kube::core::{DynamicObject, TypeMeta};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt};
use std::fmt::{Display, Formatter};

/// The type identity of a cluster object. Used as a plain value, e.g. as a set key when looking
/// for duplicate CRs.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new<G, V, K>(group: G, version: V, kind: K) -> Self
    where
        G: Into<String>,
        V: Into<String>,
        K: Into<String>,
    {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Build a `Gvk` from an `apiVersion` such as `apps/v1` or `v1`, and a kind.
    pub fn from_api_version(api_version: &str, kind: &str) -> Result<Self> {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        ensure!(
            !version.is_empty() && !version.contains('/'),
            error::ApiVersionSnafu { api_version }
        );
        ensure!(
            !kind.is_empty(),
            error::InvalidConfigSnafu {
                reason: format!("object with apiVersion '{}' has no kind", api_version)
            }
        );
        Ok(Self::new(group, version, kind))
    }

    pub fn from_type_meta(types: &TypeMeta) -> Result<Self> {
        Self::from_api_version(&types.api_version, &types.kind)
    }

    /// The `Gvk` of a decoded object. Objects without `apiVersion`/`kind` are rejected.
    pub fn of(object: &DynamicObject) -> Result<Self> {
        let types = object.types.as_ref().context(error::InvalidConfigSnafu {
            reason: format!(
                "object '{}' has no apiVersion or kind",
                object.metadata.name.as_deref().unwrap_or_default()
            ),
        })?;
        Self::from_type_meta(types)
    }

    /// The `apiVersion` string form, e.g. `apps/v1`.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl Display for Gvk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

impl From<&Gvk> for kube::core::GroupVersionKind {
    fn from(gvk: &Gvk) -> Self {
        kube::core::GroupVersionKind::gvk(&gvk.group, &gvk.version, &gvk.kind)
    }
}

/// Identifies one live object by its type, namespace and name.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub gvk: Gvk,
    /// `None` for cluster-scoped objects or when the scope is decided by the control plane.
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    /// Reference a decoded object. The object must carry a name.
    pub fn from_object(object: &DynamicObject) -> Result<Self> {
        let gvk = Gvk::of(object)?;
        let name = object
            .metadata
            .name
            .clone()
            .context(error::InvalidConfigSnafu {
                reason: format!("{} object has no metadata.name", gvk.kind),
            })?;
        Ok(Self {
            gvk,
            namespace: object.metadata.namespace.clone(),
            name,
        })
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} '{}/{}'", self.gvk.kind, namespace, self.name),
            None => write!(f, "{} '{}'", self.gvk.kind, self.name),
        }
    }
}
