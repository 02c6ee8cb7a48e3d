//! Service instance record and its asynchronous last operation

use serde::{Deserialize, Deserializer, Serialize};

/// State of the most recent asynchronous operation on an instance.
///
/// The Cloud Controller and the broker protocol use the same three strings,
/// so one enum serves both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastOperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

impl LastOperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LastOperationState::InProgress => "in progress",
            LastOperationState::Succeeded => "succeeded",
            LastOperationState::Failed => "failed",
        }
    }

    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LastOperationState::InProgress)
    }
}

impl std::fmt::Display for LastOperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last operation attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
    /// "create", "update" or "delete"
    #[serde(rename = "type", default)]
    pub operation_type: String,

    pub state: LastOperationState,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// The CC sends `"description": null` for operations without a message
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl LastOperation {
    pub fn new(operation_type: impl Into<String>, state: LastOperationState) -> Self {
        Self {
            operation_type: operation_type.into(),
            state,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A Cloud Controller service instance.
///
/// Identified by `guid` on the control-API side and by `name` on the broker
/// side (the OSB instance id is used as the name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub space_guid: String,
    #[serde(default)]
    pub service_plan_guid: String,
    #[serde(default)]
    pub dashboard_url: Option<String>,
    /// Absent for instances created before the CC tracked operations
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
}

impl ServiceInstance {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            space_guid: String::new(),
            service_plan_guid: String::new(),
            dashboard_url: None,
            last_operation: None,
        }
    }

    pub fn with_last_operation(mut self, last_operation: LastOperation) -> Self {
        self.last_operation = Some(last_operation);
        self
    }

    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }

    /// True only when the CC reports the last operation as "in progress"
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self.last_operation,
            Some(LastOperation {
                state: LastOperationState::InProgress,
                ..
            })
        )
    }

    /// Last operation state and description; a missing record reads as succeeded
    pub fn last_operation_or_succeeded(&self) -> (LastOperationState, String) {
        match &self.last_operation {
            Some(op) => (op.state, op.description.clone()),
            None => (LastOperationState::Succeeded, String::new()),
        }
    }
}
