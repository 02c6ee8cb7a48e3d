//! Broker configuration sourced from environment variables.
//!
//! Parsing is a pure function over a lookup closure; `from_env` plugs in the
//! process environment. Empty values count as unset.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use cfbroker_core::{branding, CloudControllerConfig, TokenSource};
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::auth::BrokerCredentials;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CF_CLIENT_ID: &str = "cf";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where the HTTP server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Complete broker configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub server: ServerConfig,
    pub credentials: BrokerCredentials,
    pub cloud_controller: CloudControllerConfig,
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => branding::DEFAULT_PORT,
        };
        let host = get("BROKER_HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BROKER_HOST",
                reason: e.to_string(),
            })?;

        let credentials =
            BrokerCredentials::new(require("BROKER_USERNAME")?, require("BROKER_PASSWORD")?);

        let api_url = Url::parse(require("CF_API")?.trim()).map_err(|e| ConfigError::Invalid {
            key: "CF_API",
            reason: e.to_string(),
        })?;

        let token_source = match get("CF_ACCESS_TOKEN") {
            Some(token) => TokenSource::Static(Zeroizing::new(token)),
            None => TokenSource::PasswordGrant {
                username: require("CF_USERNAME")?,
                password: Zeroizing::new(require("CF_PASSWORD")?),
                client_id: get("CF_CLIENT_ID").unwrap_or_else(|| DEFAULT_CF_CLIENT_ID.to_string()),
                client_secret: Zeroizing::new(get("CF_CLIENT_SECRET").unwrap_or_default()),
            },
        };

        let skip_ssl_validation = match get("CF_SKIP_SSL_VALIDATION") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "CF_SKIP_SSL_VALIDATION",
                reason: format!("expected true/false, got {}", raw),
            })?,
            None => false,
        };

        let timeout_secs = match get("CF_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "CF_HTTP_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            server: ServerConfig { host, port },
            credentials,
            cloud_controller: CloudControllerConfig {
                api_url,
                token_source,
                skip_ssl_validation,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
