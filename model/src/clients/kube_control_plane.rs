use super::error::{self, Result};
use super::ControlPlane;
use crate::{Gvk, ObjectRef};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, LogParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope};
use kube::{Api, Client, Config};
use log::{debug, trace};
use snafu::{OptionExt, ResultExt};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A [`ControlPlane`] backed by a live Kubernetes API server.
///
/// The mapping from group/version/kind to served resource is discovered once and cached. The cache
/// is rebuilt when [`ControlPlane::reset_discovery`] is called, and once automatically when a kind
/// cannot be found, since it may have been registered after discovery ran.
///
/// # Example
///
/// ```
///# use scorecard_model::clients::{ControlPlane, KubeControlPlane};
///# use scorecard_model::{Gvk, ObjectRef};
///# async fn no_run() {
/// let control_plane = KubeControlPlane::new().await.unwrap();
/// let cr = control_plane
///     .get(&ObjectRef {
///         gvk: Gvk::new("cache.example.com", "v1alpha1", "Memcached"),
///         namespace: Some("default".to_string()),
///         name: "example".to_string(),
///     })
///     .await
///     .unwrap();
///# }
/// ```
pub struct KubeControlPlane {
    client: Client,
    discovery: RwLock<Option<Arc<Discovery>>>,
}

impl KubeControlPlane {
    /// Create a `KubeControlPlane` using the default `kube::Client`.
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context(error::InitializationSnafu)?;
        Ok(Self::new_from_k8s_client(client))
    }

    /// Create a `KubeControlPlane` from the path to a kubeconfig file.
    pub async fn new_from_kubeconfig_path(kubeconfig_path: &Path) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(kubeconfig_path).context(error::ConfigReadSnafu {
            path: kubeconfig_path,
        })?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context(error::ClientCreateKubeconfigSnafu)?;
        let client = Client::try_from(config).context(error::InitializationSnafu)?;
        Ok(Self::new_from_k8s_client(client))
    }

    pub fn new_from_k8s_client(client: Client) -> Self {
        Self {
            client,
            discovery: RwLock::new(None),
        }
    }

    async fn discovery(&self) -> Result<Arc<Discovery>> {
        if let Some(discovery) = self.discovery.read().await.as_ref() {
            return Ok(Arc::clone(discovery));
        }
        let mut cached = self.discovery.write().await;
        if let Some(discovery) = cached.as_ref() {
            return Ok(Arc::clone(discovery));
        }
        debug!("Running API discovery");
        let discovery = Arc::new(
            Discovery::new(self.client.clone())
                .run()
                .await
                .context(error::DiscoverySnafu)?,
        );
        *cached = Some(Arc::clone(&discovery));
        Ok(discovery)
    }

    async fn resolve(&self, gvk: &Gvk) -> Result<(ApiResource, ApiCapabilities)> {
        let key = GroupVersionKind::from(gvk);
        if let Some(found) = self.discovery().await?.resolve_gvk(&key) {
            return Ok(found);
        }
        trace!("'{}' not in discovery cache, refreshing", gvk);
        self.reset_discovery().await;
        Ok(self
            .discovery()
            .await?
            .resolve_gvk(&key)
            .context(error::UnknownKindSnafu {
                gvk: gvk.to_string(),
            })?)
    }

    async fn dynamic_api(&self, gvk: &Gvk, namespace: Option<&str>) -> Result<Api<DynamicObject>> {
        let (resource, capabilities) = self.resolve(gvk).await?;
        Ok(match (&capabilities.scope, namespace) {
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
            (Scope::Namespaced, Some(namespace)) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            (Scope::Namespaced, None) => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
        })
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject> {
        let gvk = Gvk::of(object).context(error::MissingTypeSnafu)?;
        let name = object
            .metadata
            .name
            .clone()
            .context(error::MissingNameSnafu { kind: &gvk.kind })?;
        let object_ref = ObjectRef {
            gvk,
            namespace: object.metadata.namespace.clone(),
            name,
        };
        let api = self
            .dynamic_api(&object_ref.gvk, object_ref.namespace.as_deref())
            .await?;
        Ok(api
            .create(&PostParams::default(), object)
            .await
            .context(error::KubeApiCallSnafu {
                method: "create",
                what: object_ref.to_string(),
            })?)
    }

    async fn get(&self, object: &ObjectRef) -> Result<DynamicObject> {
        let api = self
            .dynamic_api(&object.gvk, object.namespace.as_deref())
            .await?;
        Ok(api
            .get(&object.name)
            .await
            .context(error::KubeApiCallSnafu {
                method: "get",
                what: object.to_string(),
            })?)
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        let api = self
            .dynamic_api(&object.gvk, object.namespace.as_deref())
            .await?;
        api.delete(&object.name, &DeleteParams::background())
            .await
            .context(error::KubeApiCallSnafu {
                method: "delete",
                what: object.to_string(),
            })?;
        Ok(())
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await.context(error::KubeApiCallSnafu {
            method: "get",
            what: format!("Deployment '{}/{}'", namespace, name),
        })?)
    }

    async fn pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api
            .list(&ListParams::default().labels(label_selector))
            .await
            .context(error::KubeApiCallSnafu {
                method: "list",
                what: format!("pods matching '{}'", label_selector),
            })?
            .items)
    }

    async fn pod_logs(&self, namespace: &str, pod: &str, container: &str) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            ..Default::default()
        };
        Ok(api
            .logs(pod, &params)
            .await
            .context(error::KubeApiCallSnafu {
                method: "get logs of",
                what: format!("container '{}' in pod '{}/{}'", container, namespace, pod),
            })?)
    }

    async fn reset_discovery(&self) {
        *self.discovery.write().await = None;
    }
}
