//! # cf-broker-proxy core library
//!
//! Everything the broker knows about, independent of how it is served.
//!
//! ## Modules
//!
//! - `branding` - Product naming and fixed defaults
//! - `domain` - Cloud Controller records and Open Service Broker shapes
//! - `control_api` - The control-API trait, filters and its error type
//! - `service` - `BrokerProxy` plus the HTTP Cloud Controller and UAA clients
//! - `error` - Broker-level error taxonomy

pub mod branding;
pub mod control_api;
pub mod domain;
pub mod error;
pub mod service;

// Re-export commonly used types
pub use control_api::*;
pub use domain::*;
pub use error::{BrokerError, BrokerResult};
pub use service::*;
