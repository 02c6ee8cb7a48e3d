//! HTTP request/response logging
//!
//! One entry and one exit line per request under a `request` span. Bodies are
//! logged at DEBUG; binding routes carry credentials and are redacted.
//!
//! Request bodies are buffered here, ahead of authentication, so they are
//! capped at `MAX_REQUEST_BODY_SIZE`.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::{debug, warn, Instrument};

use super::ApiError;
use crate::logging::{RequestSpan, TraceContext};

/// Largest request body accepted; OSB bodies are a few KiB
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// Bodies above this are summarised by size
const MAX_BODY_LOG_SIZE: usize = 64 * 1024;

/// Logged text bodies are cut to this many characters
const MAX_TEXT_CHARS: usize = 200;

/// Path fragments whose bodies may contain credentials
const SENSITIVE_PATHS: &[&str] = &["/service_bindings/"];

/// Headers worth showing at DEBUG. `authorization` is never among them.
const LOGGED_HEADERS: &[&str] = &["content-type", "accept", "user-agent", "x-broker-api-version"];

pub fn is_sensitive_path(path: &str) -> bool {
    SENSITIVE_PATHS.iter().any(|p| path.contains(p))
}

fn headers_compact(headers: &axum::http::HeaderMap) -> String {
    headers
        .iter()
        .filter(|(name, _)| LOGGED_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| format!("{}={:?}", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a body for the log
pub fn format_body(bytes: &[u8], redact: bool) -> String {
    if redact {
        return "[REDACTED]".to_string();
    }
    if bytes.is_empty() {
        return "[empty]".to_string();
    }
    if bytes.len() > MAX_BODY_LOG_SIZE {
        return format!("[{} bytes]", bytes.len());
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let compact = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|json| serde_json::to_string(&json).ok())
                .unwrap_or_else(|| text.to_string());
            truncate_chars(&compact, MAX_TEXT_CHARS)
        }
        Err(_) => format!("[binary: {} bytes]", bytes.len()),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// One-line summary of an OSB response body for the exit log
pub fn format_osb_response(bytes: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    let obj = json.as_object()?;

    if let Some(services) = obj.get("services").and_then(|s| s.as_array()) {
        return Some(format!("services: {}", services.len()));
    }
    if let Some(state) = obj.get("state").and_then(|s| s.as_str()) {
        return Some(format!("state: {}", state));
    }
    if let Some(operation) = obj.get("operation").and_then(|o| o.as_str()) {
        return Some(format!("operation: {}", operation));
    }
    if obj.contains_key("credentials") {
        return Some("credentials issued".to_string());
    }
    if let Some(description) = obj.get("description").and_then(|d| d.as_str()) {
        return Some(format!("error: {}", truncate_chars(description, MAX_TEXT_CHARS)));
    }
    None
}

/// Logging middleware for requests and responses
pub async fn http_logging_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let redact = is_sensitive_path(&path);

    let ctx = TraceContext::new(&method, &path);
    let span = RequestSpan::enter(&ctx);

    async move {
        RequestSpan::log_entry(&ctx);
        debug!(
            trace_id = %ctx.trace_id,
            headers = %headers_compact(request.headers()),
            "Request headers"
        );

        let (parts, body) = request.into_parts();
        let body_bytes = match Limited::new(body, MAX_REQUEST_BODY_SIZE).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                warn!(
                    trace_id = %ctx.trace_id,
                    "Request body exceeds {} bytes", MAX_REQUEST_BODY_SIZE
                );
                RequestSpan::log_exit(&ctx, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), None);
                return Ok(ApiError::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body exceeds {} bytes", MAX_REQUEST_BODY_SIZE),
                )
                .into_response());
            }
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, "Failed to read request body: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        };
        if !body_bytes.is_empty() {
            debug!(
                trace_id = %ctx.trace_id,
                body = %format_body(&body_bytes, redact),
                "Request body"
            );
        }

        let mut request = Request::from_parts(parts, Body::from(body_bytes));
        request.extensions_mut().insert(ctx.clone());

        let response = next.run(request).await;

        let (parts, body) = response.into_parts();
        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(trace_id = %ctx.trace_id, "Failed to read response body: {}", e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        if !body_bytes.is_empty() {
            debug!(
                trace_id = %ctx.trace_id,
                body = %format_body(&body_bytes, redact),
                "Response body"
            );
        }

        let summary = format_osb_response(&body_bytes);
        RequestSpan::log_exit(&ctx, parts.status.as_u16(), summary.as_deref());

        Ok(Response::from_parts(parts, Body::from(body_bytes)))
    }
    .instrument(span)
    .await
}
