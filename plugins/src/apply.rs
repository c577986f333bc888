use crate::context::RunContext;
use crate::error::{self, Result};
use crate::manifests;
use crate::wait;
use model::constants::PROXY_CONTAINER_NAME;
use model::{Gvk, ObjectRef, PullPolicy};
use serde_json::Value;
use snafu::ResultExt;
use std::path::Path;

/// Create every object of the manifest at `path` in the run namespace and register its deletion.
///
/// Containers named `scorecard-proxy` in any pod template get `proxy_image` and `pull_policy`.
/// Creating a `CustomResourceDefinition` refreshes the control plane's kind mapping, and creating
/// a `Deployment` makes it the operator under test: the call waits for one of its pods to run and
/// records that pod as the proxy pod.
///
/// The first failure is returned right away. Objects created before it stay registered for
/// cleanup. Nothing is retried.
pub async fn apply(
    ctx: &mut RunContext,
    path: &Path,
    proxy_image: &str,
    pull_policy: PullPolicy,
) -> Result<()> {
    for mut object in manifests::read_objects(path)? {
        let gvk = Gvk::of(&object).context(error::DecodeObjectSnafu { path })?;
        object.metadata.namespace = Some(ctx.namespace().to_string());
        let injected = inject_proxy(&gvk.kind, &mut object.data, proxy_image, pull_policy);
        let object_ref = ObjectRef::from_object(&object).context(error::DecodeObjectSnafu { path })?;
        if injected > 0 {
            ctx.log().debug(format!(
                "Set the proxy image of {} container(s) in {}",
                injected, object_ref
            ));
        }

        ctx.control_plane()
            .create(&object)
            .await
            .context(error::CreateSnafu {
                what: object_ref.to_string(),
            })?;
        ctx.log().debug(format!("Created {}", object_ref));
        ctx.register_deletion(object_ref.clone());

        if gvk.is_kind("CustomResourceDefinition") {
            ctx.control_plane().reset_discovery().await;
        }
        if gvk.group == "apps" && gvk.is_kind("Deployment") {
            ctx.set_deployment_name(object_ref.name.as_str());
            let timing = *ctx.timing();
            let pod = wait::wait_for_deployment_pod(
                ctx.control_plane().as_ref(),
                ctx.namespace(),
                &object_ref.name,
                timing.pod_timeout,
                timing.pod_poll_interval,
            )
            .await?;
            ctx.log().debug(format!(
                "Proxy pod of deployment '{}' is '{}'",
                object_ref.name,
                pod.metadata.name.as_deref().unwrap_or_default()
            ));
            ctx.set_proxy_pod(pod);
        }
    }
    Ok(())
}

/// The JSON pointers of the pod specs embedded in an object of `kind`. `*` stands for every
/// element of an array.
fn pod_spec_paths(kind: &str) -> &'static [&'static str] {
    match kind {
        "Pod" => &["/spec"],
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "ReplicationController"
        | "Job" => &["/spec/template/spec"],
        "CronJob" => &["/spec/jobTemplate/spec/template/spec"],
        "ClusterServiceVersion" => &["/spec/install/spec/deployments/*/spec/template/spec"],
        _ => &[],
    }
}

/// Replace the image and pull policy of every proxy container in the object. Returns how many
/// containers were changed.
pub fn inject_proxy(
    kind: &str,
    data: &mut Value,
    proxy_image: &str,
    pull_policy: PullPolicy,
) -> usize {
    let mut injected = 0;
    for path in pod_spec_paths(kind) {
        for pod_spec in resolve_mut(data, path) {
            let containers = match pod_spec
                .get_mut("containers")
                .and_then(Value::as_array_mut)
            {
                Some(containers) => containers,
                None => continue,
            };
            for container in containers.iter_mut() {
                if container.get("name").and_then(Value::as_str) == Some(PROXY_CONTAINER_NAME) {
                    container["image"] = Value::from(proxy_image);
                    container["imagePullPolicy"] = Value::from(pull_policy.as_str());
                    injected += 1;
                }
            }
        }
    }
    injected
}

/// Resolve a JSON pointer in which `*` segments fan out over arrays.
fn resolve_mut<'a>(value: &'a mut Value, path: &str) -> Vec<&'a mut Value> {
    let mut current = vec![value];
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        current = current
            .into_iter()
            .flat_map(|value| -> Vec<&'a mut Value> {
                match (segment, value) {
                    ("*", Value::Array(items)) => items.iter_mut().collect(),
                    (key, Value::Object(map)) => map.get_mut(key).into_iter().collect(),
                    _ => Vec::new(),
                }
            })
            .collect();
    }
    current
}
