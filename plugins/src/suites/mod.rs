/*!

Test suites run against one CR after the operator under test has given it a status.

A suite is a named, ordered collection of [`Check`]s that all take the same configuration. The
collection can be narrowed with a label [`Selector`] before it runs; every check that remains is
run once, in declaration order, and produces one [`TestResult`].

!*/

mod basic;
mod olm;

pub use basic::{basic_suite, BasicTestConfig};
pub use olm::{olm_suite, OlmTestConfig};

use crate::context::RunContext;
use crate::run_log::RunLog;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;
use model::clients::ControlPlane;
use model::{
    ClusterServiceVersion, ObjectRef, PluginType, Selector, SuiteName, SuiteOutput, Test,
    TestResult,
};
use std::path::PathBuf;
use std::sync::Arc;

/// One declared test. `run` records its outcome in `result`, which starts out as passed.
#[async_trait]
pub trait Check<C>: Send + Sync {
    fn test(&self) -> &Test;

    async fn run(&self, config: &C, result: &mut TestResult, log: &RunLog);
}

pub struct TestSuite<C> {
    name: SuiteName,
    checks: Vec<Box<dyn Check<C>>>,
    results: Vec<TestResult>,
}

impl<C> TestSuite<C>
where
    C: Send + Sync,
{
    pub fn new(name: SuiteName) -> Self {
        Self {
            name,
            checks: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn with_check<K>(mut self, check: K) -> Self
    where
        K: Check<C> + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    pub fn name(&self) -> SuiteName {
        self.name
    }

    pub fn tests(&self) -> impl Iterator<Item = &Test> {
        self.checks.iter().map(|check| check.test())
    }

    /// Keep only the tests whose labels match `selector`. Order is preserved.
    pub fn apply_selector(&mut self, selector: &Selector) {
        self.checks
            .retain(|check| selector.matches(&check.test().labels));
    }

    /// Run every remaining test in order.
    pub async fn run(&mut self, config: &C, log: &RunLog) {
        for check in &self.checks {
            let mut result = TestResult::new(check.test().clone());
            log.debug(format!("Running test '{}'", result.test.name));
            check.run(config, &mut result, log).await;
            log.debug(format!(
                "Test '{}' finished in state '{}'",
                result.test.name, result.state
            ));
            self.results.push(result);
        }
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn into_output(self, log: String) -> SuiteOutput {
        SuiteOutput {
            name: self.name,
            results: self.results,
            log,
        }
    }

    /// Describe the tests without running them. Each is reported as passed.
    pub fn into_listing(self) -> SuiteOutput {
        SuiteOutput {
            name: self.name,
            results: self
                .checks
                .iter()
                .map(|check| TestResult::new(check.test().clone()))
                .collect(),
            log: String::new(),
        }
    }
}

/// What the OLM suite needs beyond the run context.
#[derive(Debug, Clone, Default)]
pub struct OlmInputs {
    pub csv: Option<Arc<ClusterServiceVersion>>,
    pub crds_dir: PathBuf,
    pub bundle: Option<PathBuf>,
}

/// Build the suite for `plugin_type`, narrow it with `selector` and run it against `cr`. The log
/// captured since the CR's run segment started is attached to the output.
pub async fn dispatch(
    plugin_type: PluginType,
    ctx: &RunContext,
    cr: DynamicObject,
    olm: &OlmInputs,
    selector: &Selector,
) -> SuiteOutput {
    let control_plane: Arc<dyn ControlPlane> = Arc::clone(ctx.control_plane());
    let proxy_pod: Option<Pod> = ctx.proxy_pod().cloned();
    let log = ctx.log();
    match plugin_type {
        PluginType::Basic => {
            let config = BasicTestConfig {
                control_plane,
                cr,
                proxy_pod,
            };
            let mut suite = basic_suite();
            suite.apply_selector(selector);
            suite.run(&config, log).await;
            suite.into_output(log.take())
        }
        PluginType::Olm => {
            let config = OlmTestConfig {
                control_plane,
                cr,
                csv: olm.csv.clone(),
                crds_dir: olm.crds_dir.clone(),
                bundle: olm.bundle.clone(),
            };
            let mut suite = olm_suite();
            suite.apply_selector(selector);
            suite.run(&config, log).await;
            suite.into_output(log.take())
        }
    }
}

/// Describe the tests `plugin_type` would run with `selector`, without touching the cluster.
pub fn list(plugin_type: PluginType, selector: &Selector) -> SuiteOutput {
    match plugin_type {
        PluginType::Basic => {
            let mut suite = basic_suite();
            suite.apply_selector(selector);
            suite.into_listing()
        }
        PluginType::Olm => {
            let mut suite = olm_suite();
            suite.apply_selector(selector);
            suite.into_listing()
        }
    }
}

/// Fetch the live version of `cr`.
pub(crate) async fn live(
    control_plane: &dyn ControlPlane,
    cr: &DynamicObject,
) -> Result<DynamicObject, String> {
    let object = ObjectRef::from_object(cr).map_err(|e| e.to_string())?;
    control_plane
        .get(&object)
        .await
        .map_err(|e| format!("error getting custom resource: {}", e))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_selector_keeps_everything() {
        let mut suite = basic_suite();
        let before: Vec<String> = suite.tests().map(|test| test.name.clone()).collect();
        suite.apply_selector(&Selector::everything());
        let after: Vec<String> = suite.tests().map(|test| test.name.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(
            after,
            vec!["checkspec", "checkstatus", "writingintocrshaseffect"]
        );
    }

    #[test]
    fn non_matching_selector_empties_the_suite() {
        let mut suite = olm_suite();
        suite.apply_selector(&Selector::from_str("suite=nothing").unwrap());
        assert_eq!(suite.tests().count(), 0);
    }

    #[test]
    fn selector_by_test_label() {
        let output = list(
            PluginType::Basic,
            &Selector::from_str("test in (checkspectest,checkstatustest)").unwrap(),
        );
        let names: Vec<&str> = output
            .results
            .iter()
            .map(|result| result.test.name.as_str())
            .collect();
        assert_eq!(names, vec!["checkspec", "checkstatus"]);
        assert!(output.results.iter().all(TestResult::passed));
    }

    #[test]
    fn olm_listing() {
        let output = list(PluginType::Olm, &Selector::everything());
        assert_eq!(output.name, SuiteName::Olm);
        let names: Vec<&str> = output
            .results
            .iter()
            .map(|result| result.test.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "bundlevalidation",
                "crdshavevalidation",
                "crdshaveresources",
                "specdescriptors",
                "statusdescriptors"
            ]
        );
    }
}
