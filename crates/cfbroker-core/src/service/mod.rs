//! Broker services
//!
//! - `BrokerProxy` translates broker operations into control-API calls
//! - `CloudControllerClient` is the HTTP `ControlApi` implementation
//! - `UaaTokenProvider` supplies its bearer tokens

mod broker_proxy;
mod cc_api_client;
mod uaa_token;

pub use broker_proxy::BrokerProxy;
pub use cc_api_client::{CloudControllerClient, CloudControllerConfig};
pub use uaa_token::{TokenSource, UaaTokenProvider};
