use super::{live, Check, TestSuite};
use crate::run_log::RunLog;
use crate::wait::is_empty;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;
use model::clients::ControlPlane;
use model::constants::{NECESSITY_RECOMMENDED, NECESSITY_REQUIRED, PROXY_CONTAINER_NAME};
use model::{SuiteName, Test, TestResult};
use serde_json::Value;
use std::sync::Arc;

/// Request methods that change state on the API server.
const MUTATING_METHODS: &[&str] = &["PUT", "POST", "PATCH"];

pub struct BasicTestConfig {
    pub control_plane: Arc<dyn ControlPlane>,
    /// The CR as it was read from its manifest.
    pub cr: DynamicObject,
    pub proxy_pod: Option<Pod>,
}

pub fn basic_suite() -> TestSuite<BasicTestConfig> {
    TestSuite::new(SuiteName::Basic)
        .with_check(CheckSpec::default())
        .with_check(CheckStatus::default())
        .with_check(WritingIntoCrsHasEffect::default())
}

struct CheckSpec(Test);

impl Default for CheckSpec {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Basic,
            "checkspec",
            "Custom Resource has a Spec Block",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<BasicTestConfig> for CheckSpec {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &BasicTestConfig, result: &mut TestResult, _: &RunLog) {
        if config.cr.data.get("spec").map_or(true, is_empty) {
            result.fail("Add a 'spec' field to your Custom Resource");
        }
    }
}

struct CheckStatus(Test);

impl Default for CheckStatus {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Basic,
            "checkstatus",
            "Custom Resource has a Status Block",
            NECESSITY_REQUIRED,
        ))
    }
}

#[async_trait]
impl Check<BasicTestConfig> for CheckStatus {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &BasicTestConfig, result: &mut TestResult, _: &RunLog) {
        match live(config.control_plane.as_ref(), &config.cr).await {
            Ok(current) if current.data.get("status").map_or(true, is_empty) => {
                result.fail("Add a 'status' field to your Custom Resource")
            }
            Ok(_) => {}
            Err(e) => result.error(e),
        }
    }
}

struct WritingIntoCrsHasEffect(Test);

impl Default for WritingIntoCrsHasEffect {
    fn default() -> Self {
        Self(Test::new(
            SuiteName::Basic,
            "writingintocrshaseffect",
            "A CR sends PUT/POST requests to the API server to modify resources",
            NECESSITY_RECOMMENDED,
        ))
    }
}

#[async_trait]
impl Check<BasicTestConfig> for WritingIntoCrsHasEffect {
    fn test(&self) -> &Test {
        &self.0
    }

    async fn run(&self, config: &BasicTestConfig, result: &mut TestResult, log: &RunLog) {
        let pod = match &config.proxy_pod {
            Some(pod) => pod,
            None => {
                result.error("no proxy pod was found for the operator deployment");
                return;
            }
        };
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        let logs = match config
            .control_plane
            .pod_logs(namespace, name, PROXY_CONTAINER_NAME)
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                result.error(format!("error getting proxy logs: {}", e));
                return;
            }
        };
        let mutating = count_mutating_requests(&logs);
        log.debug(format!(
            "The proxy recorded {} mutating request(s) from the operator",
            mutating
        ));
        if mutating == 0 {
            result.fail(
                "The operator should write into objects to update state. No PUT or POST \
                 requests from the operator were recorded by the scorecard.",
            );
        }
    }
}

/// Count the proxy log lines that record a state-changing request. Lines that are not JSON
/// objects are ignored.
fn count_mutating_requests(logs: &str) -> usize {
    logs.lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|entry| {
            entry
                .get("method")
                .and_then(Value::as_str)
                .map_or(false, |method| MUTATING_METHODS.contains(&method))
        })
        .count()
}
