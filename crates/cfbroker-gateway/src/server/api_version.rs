//! `X-Broker-API-Version` enforcement

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cfbroker_core::branding::OSB_API_MAJOR_VERSION;
use tracing::warn;

use super::ApiError;

pub const API_VERSION_HEADER: &str = "x-broker-api-version";

/// Major version from a header value like `2.14`
pub fn parse_major(value: &str) -> Option<u32> {
    value.trim().split('.').next()?.parse().ok()
}

fn check(headers: &HeaderMap) -> Result<(), ApiError> {
    let value = headers
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::precondition_failed("X-Broker-API-Version header is required")
        })?;

    match parse_major(value) {
        Some(major) if major == OSB_API_MAJOR_VERSION => Ok(()),
        _ => Err(ApiError::precondition_failed(format!(
            "Unsupported X-Broker-API-Version {}, expected {}.x",
            value, OSB_API_MAJOR_VERSION
        ))),
    }
}

/// Rejects `/v2` requests from platforms that do not speak OSB 2.x
pub async fn api_version_middleware(request: Request, next: Next) -> Response {
    match check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            warn!(
                "[Gateway] {} {}: {}",
                request.method(),
                request.uri().path(),
                err.body.description.as_deref().unwrap_or_default()
            );
            err.into_response()
        }
    }
}
