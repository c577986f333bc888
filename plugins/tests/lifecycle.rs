mod mock;

use mock::{write, MockControlPlane, NAMESPACE, OPERATOR};
use model::{Gvk, ObjectRef, PullPolicy};
use scorecard_plugins::{apply, wait_for_status, RunContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const OBJECTS: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: first
---
---
apiVersion: v1
kind: Secret
metadata:
  name: second
---
apiVersion: v1
kind: Service
metadata:
  name: third
"#;

fn missing_widget() -> ObjectRef {
    ObjectRef {
        gvk: Gvk::new("example.com", "v1alpha1", "Widget"),
        namespace: Some(NAMESPACE.to_string()),
        name: "missing".to_string(),
    }
}

#[tokio::test]
async fn created_objects_are_deleted_in_reverse() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write(dir.path(), "objects.yaml", OBJECTS);
    let control_plane = Arc::new(MockControlPlane::new());
    let mut ctx = RunContext::new(control_plane.clone(), NAMESPACE);

    apply(&mut ctx, &manifest, "proxy:test", PullPolicy::Always)
        .await
        .unwrap();
    assert_eq!(ctx.cleanup().len(), 3);
    assert_eq!(control_plane.live_objects().len(), 3);

    assert_eq!(ctx.run_cleanup().await, 0);
    assert!(ctx.cleanup().is_empty());
    assert_eq!(
        control_plane.deletes(),
        vec![
            "delete Service 'scorecard/third'",
            "delete Secret 'scorecard/second'",
            "delete ConfigMap 'scorecard/first'",
        ]
    );
    assert!(control_plane.live_objects().is_empty());
}

#[tokio::test]
async fn failed_create_keeps_earlier_registrations() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write(dir.path(), "objects.yaml", OBJECTS);
    let control_plane = Arc::new(MockControlPlane::new().failing_create("Secret"));
    let mut ctx = RunContext::new(control_plane.clone(), NAMESPACE);

    assert!(apply(&mut ctx, &manifest, "proxy:test", PullPolicy::Always)
        .await
        .is_err());
    assert_eq!(ctx.cleanup().descriptions(), vec!["ConfigMap 'scorecard/first'"]);
    assert_eq!(control_plane.creates(), vec!["create ConfigMap 'scorecard/first'"]);

    ctx.run_cleanup().await;
    assert!(control_plane.live_objects().is_empty());
}

#[tokio::test]
async fn deployment_becomes_the_operator_under_test() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write(dir.path(), "operator.yaml", OPERATOR);
    let control_plane = Arc::new(MockControlPlane::new());
    let mut ctx = RunContext::new(control_plane.clone(), NAMESPACE);

    apply(&mut ctx, &manifest, "proxy:test", PullPolicy::Never)
        .await
        .unwrap();
    assert_eq!(ctx.deployment_name(), Some("widget-operator"));
    let pod = ctx.proxy_pod().unwrap();
    assert_eq!(pod.metadata.name.as_deref(), Some("widget-operator-7d4b9c"));

    ctx.run_cleanup().await;
    ctx.reset_for_next_cr(false);
    assert!(ctx.deployment_name().is_none());
    assert!(ctx.proxy_pod().is_none());
}

#[tokio::test(start_paused = true)]
async fn status_wait_times_out_within_one_interval() {
    let control_plane = MockControlPlane::new();
    let timeout = Duration::from_secs(3);
    let start = Instant::now();
    let err = wait_for_status(&control_plane, timeout, &missing_widget())
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout(), "{}", err);
    assert!(err.to_string().contains("Widget 'scorecard/missing'"));
    assert!(elapsed >= timeout, "{:?}", elapsed);
    assert!(
        elapsed <= timeout + scorecard_plugins::STATUS_POLL_INTERVAL,
        "{:?}",
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn status_wait_stops_on_other_errors() {
    let control_plane = MockControlPlane::new().forbidden_gets();
    let start = Instant::now();
    let err = wait_for_status(&control_plane, Duration::from_secs(3), &missing_widget())
        .await
        .unwrap_err();

    assert!(!err.is_timeout(), "{}", err);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn status_is_returned_once_present() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write(dir.path(), "cr.yaml", &mock::widget("ready"));
    let control_plane = Arc::new(MockControlPlane::new().with_status_for("Widget"));
    let mut ctx = RunContext::new(control_plane.clone(), NAMESPACE);
    apply(&mut ctx, &manifest, "proxy:test", PullPolicy::Always)
        .await
        .unwrap();

    let object = ObjectRef {
        name: "ready".to_string(),
        ..missing_widget()
    };
    let current = wait_for_status(control_plane.as_ref(), Duration::from_secs(1), &object)
        .await
        .unwrap();
    assert!(scorecard_plugins::has_status(&current));
    ctx.run_cleanup().await;
}
