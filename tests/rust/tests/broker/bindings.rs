//! Bind and unbind through service keys

use cfbroker_core::{BindDetails, BrokerError, LastOperationState, UnbindDetails};
use pretty_assertions::assert_eq;
use tests::fixtures::{self, PLAN_GUID, SERVICE_GUID};
use tests::ops;

fn bind_details() -> BindDetails {
    BindDetails {
        service_id: SERVICE_GUID.to_string(),
        plan_id: PLAN_GUID.to_string(),
        app_guid: Some("app-1".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bind_creates_key_named_after_binding() {
    let api = fixtures::marketplace().with_instance(fixtures::instance(
        "guid-1",
        "db-1",
        LastOperationState::Succeeded,
    ));
    let (api, proxy) = fixtures::broker(api);

    let binding = proxy.bind("db-1", "binding-1", &bind_details()).await.unwrap();

    let keys = api.keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].name, "binding-1");
    assert_eq!(keys[0].service_instance_guid, "guid-1");
    assert_eq!(
        binding.credentials.get("uri"),
        Some(&serde_json::json!("stub://guid-1/binding-1"))
    );
}

#[tokio::test]
async fn test_bind_unknown_instance() {
    let (api, proxy) = fixtures::broker(fixtures::marketplace());

    let err = proxy
        .bind("missing", "binding-1", &bind_details())
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::InstanceNotFound(ref name) if name == "missing"));
    assert_eq!(api.mutating_calls(), 0);
}

#[tokio::test]
async fn test_unbind_deletes_key() {
    let api = fixtures::marketplace()
        .with_key(fixtures::key("key-guid-1", "binding-1", "guid-1"))
        .with_key(fixtures::key("key-guid-2", "binding-2", "guid-1"));
    let (api, proxy) = fixtures::broker(api);

    proxy
        .unbind("db-1", "binding-1", &UnbindDetails::default())
        .await
        .unwrap();

    let remaining: Vec<String> = api.keys().into_iter().map(|k| k.name).collect();
    assert_eq!(remaining, vec!["binding-2".to_string()]);
    assert_eq!(api.calls(ops::DELETE_SERVICE_KEY), 1);
}

#[tokio::test]
async fn test_unbind_unknown_binding() {
    let (api, proxy) = fixtures::broker(fixtures::marketplace());

    let err = proxy
        .unbind("db-1", "missing", &UnbindDetails::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::ServiceKeyNotFound(_)));
    assert_eq!(err.to_string(), "Service key 'missing' not found");
    assert_eq!(api.mutating_calls(), 0);
}

#[tokio::test]
async fn test_warnings_do_not_fail_operations() {
    let api = fixtures::marketplace()
        .with_warning("Plan is deprecated")
        .with_key(fixtures::key("key-guid-1", "binding-1", "guid-1"));
    let (_api, proxy) = fixtures::broker(api);

    proxy
        .unbind("db-1", "binding-1", &UnbindDetails::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upstream_bind_failure_passes_through() {
    let api = fixtures::marketplace().with_instance(fixtures::instance(
        "guid-1",
        "db-1",
        LastOperationState::Succeeded,
    ));
    let (api, proxy) = fixtures::broker(api);
    api.fail(ops::CREATE_SERVICE_KEY, 409);

    let err = proxy
        .bind("db-1", "binding-1", &bind_details())
        .await
        .unwrap_err();

    match err {
        BrokerError::Upstream(e) => assert_eq!(e.status(), Some(409)),
        other => panic!("unexpected error: {:?}", other),
    }
}
