//! Basic auth and API-version enforcement

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use cfbroker_gateway::server::MAX_REQUEST_BODY_SIZE;
use pretty_assertions::assert_eq;
use tests::{fixtures, ops};
use tower::ServiceExt;

use super::{app, basic, send, API_VERSION, PASSWORD, USERNAME};

#[tokio::test]
async fn test_health_is_public() {
    let (_api, app) = app(fixtures::marketplace());

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_credentials() {
    let (api, app) = app(fixtures::marketplace());

    let request = Request::get("/v2/catalog")
        .header("X-Broker-API-Version", API_VERSION)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"cf-broker-proxy\""
    );
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_wrong_password() {
    let (_api, app) = app(fixtures::marketplace());

    let request = Request::get("/v2/catalog")
        .header(header::AUTHORIZATION, basic(USERNAME, "wrong"))
        .header("X-Broker-API-Version", API_VERSION)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["description"], "Unauthorized");
}

#[tokio::test]
async fn test_auth_is_checked_before_version() {
    let (_api, app) = app(fixtures::marketplace());

    let request = Request::get("/v2/catalog").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_api_version() {
    let (api, app) = app(fixtures::marketplace());

    let request = Request::get("/v2/catalog")
        .header(header::AUTHORIZATION, basic(USERNAME, PASSWORD))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(body["description"].as_str().unwrap().contains("X-Broker-API-Version"));
    assert_eq!(api.calls(ops::GET_SERVICES), 0);
}

#[tokio::test]
async fn test_unsupported_api_version() {
    let (_api, app) = app(fixtures::marketplace());

    let request = Request::get("/v2/catalog")
        .header(header::AUTHORIZATION, basic(USERNAME, PASSWORD))
        .header("X-Broker-API-Version", "1.0")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_oversized_body_is_rejected_before_auth() {
    let (api, app) = app(fixtures::marketplace());

    let request = Request::put("/v2/service_instances/db-1")
        .header("X-Broker-API-Version", API_VERSION)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b' '; MAX_REQUEST_BODY_SIZE + 1]))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body["description"],
        format!("Request body exceeds {} bytes", MAX_REQUEST_BODY_SIZE)
    );
    assert_eq!(api.total_calls(), 0);
}
