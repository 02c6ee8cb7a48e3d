//! Platform authentication for the broker
//!
//! The platform calls every `/v2` route with HTTP basic auth using the
//! credentials the broker was registered with.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::server::ApiError;

/// Username and password the platform must present
#[derive(Clone)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl BrokerCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Check a presented username/password pair.
    ///
    /// Both halves are always compared, each in constant time.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = digest_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = digest_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Compare SHA-256 digests so timing does not depend on where inputs differ
fn digest_eq(expected: &[u8], presented: &[u8]) -> bool {
    let a = Sha256::digest(expected);
    let b = Sha256::digest(presented);
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header
pub fn parse_basic_auth(headers: &HeaderMap) -> Option<(String, Zeroizing<String>)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = Zeroizing::new(String::from_utf8(decoded).ok()?);

    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), Zeroizing::new(password.to_string())))
}

/// Axum middleware rejecting requests without valid broker credentials
pub async fn basic_auth_middleware(
    State(expected): State<Arc<BrokerCredentials>>,
    request: Request,
    next: Next,
) -> Response {
    match parse_basic_auth(request.headers()) {
        Some((username, password)) if expected.verify(&username, &password) => {
            debug!("[Auth] Platform authenticated as {}", username);
            next.run(request).await
        }
        Some((username, _)) => {
            warn!("[Auth] Rejected credentials for user {}", username);
            ApiError::unauthorized().into_response()
        }
        None => {
            warn!("[Auth] Missing or malformed Authorization header");
            ApiError::unauthorized().into_response()
        }
    }
}
