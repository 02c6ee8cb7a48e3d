//! Open Service Broker request details and operation results
//!
//! Request types deserialize from OSB v2 JSON bodies (or query strings).
//! Result types are protocol-neutral; the HTTP layer decides status codes and
//! response bodies from them.

use serde::{Deserialize, Serialize};

use super::{Credentials, JsonObject, LastOperationState, Parameters};

/// Body of `PUT /v2/service_instances/{instance_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: String,
    #[serde(default)]
    pub space_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonObject>,
}

/// Result of a provision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedServiceSpec {
    pub dashboard_url: Option<String>,
    pub is_async: bool,
    /// Instance GUID, handed back by the platform when polling
    pub operation_data: String,
}

/// Body of `PATCH /v2/service_instances/{instance_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonObject>,
}

/// Result of an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateServiceSpec {
    pub is_async: bool,
    pub operation_data: String,
}

/// Query of `DELETE /v2/service_instances/{instance_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprovisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Result of a deprovision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprovisionServiceSpec {
    pub is_async: bool,
    pub operation_data: String,
}

/// Body of `PUT .../service_bindings/{binding_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_resource: Option<JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// Result of a bind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub credentials: Credentials,
}

/// Query of `DELETE .../service_bindings/{binding_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Result of a last-operation poll (OSB response body as-is)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperationStatus {
    pub state: LastOperationState,
    #[serde(default)]
    pub description: String,
}
