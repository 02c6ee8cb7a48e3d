//! cf-broker-proxy gateway
//!
//! HTTP server exposing the Open Service Broker v2 API:
//! - Basic authentication for the platform
//! - `X-Broker-API-Version` enforcement
//! - Request/response logging with trace ids
//! - Mapping of broker errors onto OSB status codes
//! - Environment-driven configuration

pub mod auth;
pub mod config;
pub mod logging;
pub mod server;

pub use auth::BrokerCredentials;
pub use config::{BrokerConfig, ConfigError, ServerConfig};
pub use server::{build_router, AppState, BrokerServer};
