use crate::cleanup::{CleanupAction, CleanupRegistry};
use crate::run_log::RunLog;
use crate::wait;
use k8s_openapi::api::core::v1::Pod;
use model::clients::ControlPlane;
use model::ObjectRef;
use std::sync::Arc;
use std::time::Duration;

/// Poll intervals and deadlines used while provisioning and tearing down objects.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Timing {
    /// How often a CR is polled for its status.
    pub status_poll_interval: Duration,
    pub pod_poll_interval: Duration,
    /// How long to wait for a running pod after a deployment is created.
    pub pod_timeout: Duration,
    pub deletion_poll_interval: Duration,
    /// How long a cleanup action waits for its object to disappear.
    pub deletion_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            status_poll_interval: Duration::from_millis(100),
            pod_poll_interval: Duration::from_secs(1),
            pod_timeout: Duration::from_secs(60),
            deletion_poll_interval: Duration::from_secs(1),
            deletion_timeout: Duration::from_secs(10),
        }
    }
}

/// The state of one scorecard run, passed explicitly to everything that needs it.
pub struct RunContext {
    control_plane: Arc<dyn ControlPlane>,
    namespace: String,
    cleanup: CleanupRegistry,
    deployment_name: Option<String>,
    proxy_pod: Option<Pod>,
    log: RunLog,
    timing: Timing,
}

impl RunContext {
    pub fn new<S>(control_plane: Arc<dyn ControlPlane>, namespace: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            control_plane,
            namespace: namespace.into(),
            cleanup: CleanupRegistry::new(),
            deployment_name: None,
            proxy_pod: None,
            log: RunLog::new(),
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn control_plane(&self) -> &Arc<dyn ControlPlane> {
        &self.control_plane
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn cleanup(&self) -> &CleanupRegistry {
        &self.cleanup
    }

    pub fn deployment_name(&self) -> Option<&str> {
        self.deployment_name.as_deref()
    }

    pub fn set_deployment_name<S: Into<String>>(&mut self, name: S) {
        self.deployment_name = Some(name.into())
    }

    pub fn proxy_pod(&self) -> Option<&Pod> {
        self.proxy_pod.as_ref()
    }

    pub fn set_proxy_pod(&mut self, pod: Pod) {
        self.proxy_pod = Some(pod)
    }

    /// Register the deletion of `object`. The action deletes it, then waits for it to be gone.
    pub fn register_deletion(&mut self, object: ObjectRef) {
        let control_plane = Arc::clone(&self.control_plane);
        let timing = self.timing;
        self.cleanup
            .push(CleanupAction::new(object.to_string(), move || async move {
                wait::delete_and_wait(
                    control_plane.as_ref(),
                    &object,
                    timing.deletion_timeout,
                    timing.deletion_poll_interval,
                )
                .await
            }));
    }

    /// Run and drain every registered cleanup action. Returns the number of failures.
    pub async fn run_cleanup(&mut self) -> usize {
        let failures = self.cleanup.run(&self.log).await;
        if failures > 0 {
            self.log
                .warn(format!("{} object(s) could not be cleaned up", failures));
        }
        failures
    }

    /// Forget the operator deployment created for the previous CR. Operators that were deployed
    /// ahead of the run are kept with `keep_operator`.
    pub fn reset_for_next_cr(&mut self, keep_operator: bool) {
        if !keep_operator {
            self.deployment_name = None;
            self.proxy_pod = None;
        }
    }
}
