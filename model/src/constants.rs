/// Helper macro to avoid retyping the base domain-like name of the scorecard when creating further
/// string constants from it. When given no parameters, this returns the base domain-like name.
/// When given a string literal parameter it adds `/parameter` to the end.
macro_rules! scorecard {
    () => {
        "scorecard.operatorframework.io"
    };
    ($s:literal) => {
        concat!(scorecard!(), "/", $s)
    };
}

pub const SCORECARD: &str = scorecard!();

// Sidecar
/// The reserved container name whose image and pull policy are replaced before creation.
pub const PROXY_CONTAINER_NAME: &str = "scorecard-proxy";
pub const DEFAULT_PROXY_IMAGE: &str = "quay.io/operator-framework/scorecard-proxy:master";

// Label keys used on declared tests
pub const LABEL_SUITE: &str = "suite";
pub const LABEL_TEST: &str = "test";
pub const LABEL_NECESSITY: &str = "necessity";
pub const NECESSITY_REQUIRED: &str = "required";
pub const NECESSITY_RECOMMENDED: &str = "recommended";

// Annotation holding example CRs in a ClusterServiceVersion
pub const ALM_EXAMPLES_ANNOTATION: &str = "alm-examples";
pub const INSTALL_STRATEGY_DEPLOYMENT: &str = "deployment";

// Defaults
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_DEPLOY_DIR: &str = "deploy";
pub const DEFAULT_CRDS_SUBDIR: &str = "crds";
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONFIG_FILE: &str = ".osdk-scorecard.yaml";

// Labels written on objects the scorecard creates
pub const LABEL_MANAGED_BY: &str = scorecard!("managed-by");

#[test]
fn scorecard_constants_macro_test() {
    assert_eq!("scorecard.operatorframework.io", scorecard!());
    assert_eq!(
        "scorecard.operatorframework.io/managed-by",
        LABEL_MANAGED_BY
    );
}
