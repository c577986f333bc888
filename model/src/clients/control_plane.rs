use crate::clients::Result;
use crate::ObjectRef;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;

/// The `ControlPlane` is the scorecard's interface to the cluster API. Every component that reads
/// or writes cluster state goes through it, which allows a mock to be injected for testing the
/// orchestration without a cluster. In practice you will use [`KubeControlPlane`].
///
/// Objects are untyped [`DynamicObject`]s; the implementation is responsible for mapping an
/// object's group/version/kind to the resource the API server serves it under.
///
/// [`KubeControlPlane`]: crate::clients::KubeControlPlane
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Create `object`. The object must carry `apiVersion`, `kind` and `metadata.name`. The
    /// namespace in its metadata is used for namespaced kinds and ignored for cluster-scoped ones.
    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject>;

    /// Get the current server-side representation of an object.
    async fn get(&self, object: &ObjectRef) -> Result<DynamicObject>;

    /// Delete an object. Deletion may complete asynchronously on the server.
    async fn delete(&self, object: &ObjectRef) -> Result<()>;

    /// Get a deployment.
    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;

    /// List the pods in `namespace` that match `label_selector`.
    async fn pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>>;

    /// Get the full log of one container.
    async fn pod_logs(&self, namespace: &str, pod: &str, container: &str) -> Result<String>;

    /// Forget cached resource-kind mappings. Must be called after new kinds (CRDs) are registered.
    async fn reset_discovery(&self);
}
