//! Bearer tokens for the Cloud Controller
//!
//! Either a pre-issued token from configuration, or a UAA password grant.
//! The token endpoint is discovered once from `GET /v2/info`; granted tokens
//! are cached and renewed shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use url::Url;
use zeroize::Zeroizing;

use super::cc_api_client::join_under;
use crate::control_api::ControlApiError;

/// Renew this many seconds before the token actually expires
const REFRESH_MARGIN_SECS: i64 = 30;

/// Lifetime assumed when UAA omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 300;

/// Where Cloud Controller bearer tokens come from
#[derive(Clone)]
pub enum TokenSource {
    /// A token issued out of band
    Static(Zeroizing<String>),
    /// UAA `grant_type=password`
    PasswordGrant {
        username: String,
        password: Zeroizing<String>,
        client_id: String,
        client_secret: Zeroizing<String>,
    },
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("Static([REDACTED])"),
            TokenSource::PasswordGrant {
                username,
                client_id,
                ..
            } => f
                .debug_struct("PasswordGrant")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .field("client_id", client_id)
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    token_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UaaErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

struct CachedToken {
    access_token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

/// Absolute expiry for a grant answered at `now`
fn token_expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> Result<DateTime<Utc>, ControlApiError> {
    let secs = expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| ControlApiError::Auth(format!("UAA returned an invalid expires_in: {}", secs)))
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Supplies (and caches) bearer tokens for Cloud Controller requests
pub struct UaaTokenProvider {
    http: reqwest::Client,
    api_url: Url,
    source: TokenSource,
    token_endpoint: OnceCell<Url>,
    cached: Mutex<Option<CachedToken>>,
}

impl UaaTokenProvider {
    pub fn new(http: reqwest::Client, api_url: Url, source: TokenSource) -> Self {
        Self {
            http,
            api_url,
            source,
            token_endpoint: OnceCell::new(),
            cached: Mutex::new(None),
        }
    }

    /// A token valid for at least the refresh margin.
    ///
    /// Concurrent callers share one in-flight grant.
    pub async fn access_token(&self) -> Result<Zeroizing<String>, ControlApiError> {
        let (username, password, client_id, client_secret) = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::PasswordGrant {
                username,
                password,
                client_id,
                client_secret,
            } => (username, password, client_id, client_secret),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
            debug!("[UAA] Cached token expires at {}, renewing", token.expires_at);
        }

        let endpoint = self.token_endpoint().await?;
        info!("[UAA] Requesting token for {} from {}", username, endpoint);

        let response = self
            .http
            .post(endpoint.clone())
            .basic_auth(client_id, Some(client_secret.as_str()))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<UaaErrorBody>(&body)
                .ok()
                .and_then(|b| b.error_description.or(b.error))
                .unwrap_or(body);
            return Err(ControlApiError::Auth(format!(
                "UAA returned {}: {}",
                status.as_u16(),
                reason
            )));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = token_expiry(Utc::now(), token.expires_in)?;
        let access_token = Zeroizing::new(token.access_token);

        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    async fn token_endpoint(&self) -> Result<&Url, ControlApiError> {
        self.token_endpoint
            .get_or_try_init(|| async {
                let info_url = join_under(&self.api_url, "/v2/info")?;
                let response = self.http.get(info_url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ControlApiError::Auth(format!(
                        "token endpoint discovery returned {}",
                        status.as_u16()
                    )));
                }
                let info: InfoResponse = response.json().await?;
                let base = Url::parse(&info.token_endpoint)?;
                let endpoint = join_under(&base, "/oauth/token")?;
                debug!("[UAA] Token endpoint: {}", endpoint);
                Ok(endpoint)
            })
            .await
    }
}
