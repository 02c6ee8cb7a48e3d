//! Domain entities
//!
//! Two families of types live here:
//! - Cloud Controller records (`Service`, `ServicePlan`, `Space`,
//!   `ServiceInstance`, `ServiceKey`), the control-API side of the mapping
//! - Open Service Broker shapes (`catalog`, `broker`), the protocol side

mod broker;
mod catalog;
mod instance;
mod service;
mod service_key;
mod space;

pub use broker::*;
pub use catalog::*;
pub use instance::*;
pub use service::*;
pub use service_key::*;
pub use space::*;

/// Schemaless JSON object passed through to or from the Cloud Controller.
///
/// Values keep their JSON type (string, number, bool, null, object, array).
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Provisioning or binding parameters
pub type Parameters = JsonObject;

/// Credentials carried by a service key
pub type Credentials = JsonObject;
