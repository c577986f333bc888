/*!

A [`ControlPlane`] that keeps objects in memory so that scorecard runs can be tested without a
cluster. It records the calls that change state so tests can check what was created and deleted,
and in which order.

!*/

#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use kube::error::ErrorResponse;
use model::clients::{ControlPlane, Error, Result};
use model::{Gvk, ObjectRef, RunConfig};
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const NAMESPACE: &str = "scorecard";

pub const CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
  - name: v1alpha1
    served: true
    storage: true
    schema:
      openAPIV3Schema:
        type: object
        properties:
          spec:
            type: object
            properties:
              size:
                type: integer
"#;

pub const OPERATOR: &str = r#"apiVersion: v1
kind: ServiceAccount
metadata:
  name: widget-operator
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: widget-operator
spec:
  selector:
    matchLabels:
      name: widget-operator
  template:
    metadata:
      labels:
        name: widget-operator
    spec:
      containers:
      - name: widget-operator
        image: widget-operator:latest
      - name: scorecard-proxy
        image: placeholder
"#;

pub const PROXY_LOGS: &str = r#"{"level":"info","msg":"request","method":"GET","uri":"/apis/example.com/v1alpha1/widgets"}
{"level":"info","msg":"request","method":"PUT","uri":"/apis/example.com/v1alpha1/namespaces/scorecard/widgets/cr1/status"}
"#;

pub fn widget(name: &str) -> String {
    format!(
        "apiVersion: example.com/v1alpha1\nkind: Widget\nmetadata:\n  name: {}\nspec:\n  size: 3\n",
        name
    )
}

/// Write `contents` to `dir/file` and return the path.
pub fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A basic run against `crs` with the widget CRD and operator written to `dir`.
pub fn basic_config(dir: &Path, crs: Vec<PathBuf>) -> RunConfig {
    RunConfig {
        namespace: NAMESPACE.to_string(),
        cr_manifests: crs,
        global_manifest: Some(write(dir, "crd.yaml", CRD)),
        namespaced_manifest: Some(write(dir, "operator.yaml", OPERATOR)),
        ..RunConfig::default()
    }
}

pub fn not_found(method: &str, what: &str) -> Error {
    api_error(method, what, 404, "NotFound")
}

pub fn api_error(method: &str, what: &str, code: u16, reason: &str) -> Error {
    Error::api_call(
        method,
        what,
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} {}", reason, what),
            reason: reason.to_string(),
            code,
        }),
    )
}

#[derive(Default)]
pub struct MockControlPlane {
    objects: Mutex<Vec<(ObjectRef, DynamicObject)>>,
    created: Mutex<Vec<DynamicObject>>,
    calls: Mutex<Vec<String>>,
    status_kinds: HashSet<String>,
    failing_creates: HashSet<String>,
    forbidden_gets: bool,
    proxy_logs: String,
    panic_on_logs: bool,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects of `kind` get a status as soon as they are created.
    pub fn with_status_for(mut self, kind: &str) -> Self {
        self.status_kinds.insert(kind.to_string());
        self
    }

    /// Creating an object of `kind` fails.
    pub fn failing_create(mut self, kind: &str) -> Self {
        self.failing_creates.insert(kind.to_string());
        self
    }

    /// Every `get` is answered with `403 Forbidden`.
    pub fn forbidden_gets(mut self) -> Self {
        self.forbidden_gets = true;
        self
    }

    pub fn with_proxy_logs(mut self, logs: &str) -> Self {
        self.proxy_logs = logs.to_string();
        self
    }

    /// Fetching proxy logs panics.
    pub fn panic_on_logs(mut self) -> Self {
        self.panic_on_logs = true;
        self
    }

    /// Start out with `object` already present, as if it had been deployed before the run.
    pub fn with_object(self, object: serde_json::Value) -> Self {
        let object: DynamicObject = serde_json::from_value(object).unwrap();
        let object_ref = ObjectRef::from_object(&object).unwrap();
        self.objects.lock().unwrap().push((object_ref, object));
        self
    }

    /// The `create`, `delete` and `reset_discovery` calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("delete "))
            .collect()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("create "))
            .collect()
    }

    /// Every object that was created, as it was sent.
    pub fn created(&self, kind: &str) -> Vec<DynamicObject> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|object| Gvk::of(object).unwrap().kind == kind)
            .cloned()
            .collect()
    }

    pub fn live_objects(&self) -> Vec<ObjectRef> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(object_ref, _)| object_ref.clone())
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call)
    }

    fn find(&self, object: &ObjectRef) -> Option<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(object_ref, _)| object_ref == object)
            .map(|(_, object)| object.clone())
    }

    fn deployments(&self, namespace: &str) -> Vec<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(object_ref, _)| {
                object_ref.gvk.kind == "Deployment"
                    && object_ref.namespace.as_deref() == Some(namespace)
            })
            .map(|(_, object)| object.clone())
            .collect()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject> {
        let object_ref = ObjectRef::from_object(object).unwrap();
        if self.failing_creates.contains(&object_ref.gvk.kind) {
            return Err(api_error(
                "create",
                &object_ref.to_string(),
                422,
                "Invalid",
            ));
        }
        self.record(format!("create {}", object_ref));
        self.created.lock().unwrap().push(object.clone());
        let mut stored = object.clone();
        if self.status_kinds.contains(&object_ref.gvk.kind) {
            stored.data["status"] = json!({ "nodes": ["node-1"] });
        }
        self.objects
            .lock()
            .unwrap()
            .push((object_ref, stored.clone()));
        Ok(stored)
    }

    async fn get(&self, object: &ObjectRef) -> Result<DynamicObject> {
        if self.forbidden_gets {
            return Err(api_error("get", &object.to_string(), 403, "Forbidden"));
        }
        self.find(object)
            .ok_or_else(|| not_found("get", &object.to_string()))
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        self.record(format!("delete {}", object));
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|(object_ref, _)| object_ref != object);
        if objects.len() == before {
            return Err(not_found("delete", &object.to_string()));
        }
        Ok(())
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.deployments(namespace)
            .into_iter()
            .find(|object| object.metadata.name.as_deref() == Some(name))
            .map(|object| serde_json::from_value(serde_json::to_value(object).unwrap()).unwrap())
            .ok_or_else(|| not_found("get", name))
    }

    async fn pods(&self, namespace: &str, _label_selector: &str) -> Result<Vec<Pod>> {
        Ok(self
            .deployments(namespace)
            .iter()
            .map(|deployment| Pod {
                metadata: ObjectMeta {
                    name: Some(format!(
                        "{}-7d4b9c",
                        deployment.metadata.name.as_deref().unwrap_or_default()
                    )),
                    namespace: Some(namespace.to_string()),
                    ..ObjectMeta::default()
                },
                status: Some(PodStatus {
                    phase: Some("Running".to_string()),
                    ..PodStatus::default()
                }),
                ..Pod::default()
            })
            .collect())
    }

    async fn pod_logs(&self, _namespace: &str, _pod: &str, _container: &str) -> Result<String> {
        if self.panic_on_logs {
            panic!("proxy logs are unavailable");
        }
        Ok(self.proxy_logs.clone())
    }

    async fn reset_discovery(&self) {
        self.record("reset_discovery".to_string())
    }
}
