use crate::error::{self, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;
use log::{debug, trace};
use model::clients::ControlPlane;
use model::ObjectRef;
use serde_json::Value;
use snafu::ResultExt;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// The interval at which a CR is polled for its status.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `object` until it carries a non-empty `status`, or fail with a timeout error after
/// `timeout`. The object not existing yet is tolerated; any other control plane error ends the
/// wait immediately.
pub async fn wait_for_status(
    control_plane: &dyn ControlPlane,
    timeout: Duration,
    object: &ObjectRef,
) -> Result<DynamicObject> {
    poll_for_status(control_plane, timeout, STATUS_POLL_INTERVAL, object).await
}

pub(crate) async fn poll_for_status(
    control_plane: &dyn ControlPlane,
    timeout: Duration,
    interval: Duration,
    object: &ObjectRef,
) -> Result<DynamicObject> {
    let start = Instant::now();
    loop {
        match control_plane.get(object).await {
            Ok(current) if has_status(&current) => {
                debug!("{} reported a status after {:?}", object, start.elapsed());
                return Ok(current);
            }
            Ok(_) => trace!("{} has no status yet", object),
            Err(e) if e.is_not_found() => trace!("{} does not exist yet", object),
            Err(e) => {
                return Err(e).context(error::GetSnafu {
                    what: object.to_string(),
                })
            }
        }
        if start.elapsed() >= timeout {
            return error::StatusTimeoutSnafu {
                object: object.to_string(),
                timeout,
            }
            .fail();
        }
        sleep(interval).await;
    }
}

/// Whether the object's `status` is present and holds something.
pub fn has_status(object: &DynamicObject) -> bool {
    object.data.get("status").map_or(false, |status| !is_empty(status))
}

/// `null`, `{}`, `[]` and `""` count as empty.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Delete `object` and wait until the control plane no longer returns it.
pub(crate) async fn delete_and_wait(
    control_plane: &dyn ControlPlane,
    object: &ObjectRef,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    match control_plane.delete(object).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => {
            return Err(e).context(error::DeleteSnafu {
                what: object.to_string(),
            })
        }
    }
    let start = Instant::now();
    loop {
        match control_plane.get(object).await {
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => {
                return Err(e).context(error::GetSnafu {
                    what: object.to_string(),
                })
            }
            Ok(_) => trace!("{} is still being deleted", object),
        }
        if start.elapsed() >= timeout {
            return error::DeletionTimeoutSnafu {
                object: object.to_string(),
                timeout,
            }
            .fail();
        }
        sleep(interval).await;
    }
}

/// Wait for a pod of `deployment` to reach the `Running` phase and return it.
pub(crate) async fn wait_for_deployment_pod(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    deployment: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Pod> {
    let start = Instant::now();
    loop {
        if let Some(pod) = running_pod(control_plane, namespace, deployment).await? {
            return Ok(pod);
        }
        if start.elapsed() >= timeout {
            return error::PodTimeoutSnafu {
                deployment,
                timeout,
            }
            .fail();
        }
        sleep(interval).await;
    }
}

async fn running_pod(
    control_plane: &dyn ControlPlane,
    namespace: &str,
    deployment: &str,
) -> Result<Option<Pod>> {
    let what = || format!("Deployment '{}/{}'", namespace, deployment);
    let deployment = match control_plane.deployment(namespace, deployment).await {
        Ok(deployment) => deployment,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e).context(error::GetSnafu { what: what() }),
    };
    let selector = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.selector.match_labels.as_ref())
        .map(|labels| {
            labels
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let pods = control_plane
        .pods(namespace, &selector)
        .await
        .context(error::GetSnafu {
            what: format!("pods of {}", what()),
        })?;
    Ok(pods.into_iter().find(|pod| {
        pod.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            == Some("Running")
    }))
}
