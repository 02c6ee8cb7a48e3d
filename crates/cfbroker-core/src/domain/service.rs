//! Service offerings and their plans, as reported by the Cloud Controller

use serde::{Deserialize, Serialize};

/// A service offering registered with the Cloud Controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Cloud Controller GUID
    pub guid: String,

    /// Display label (the CC `label` field)
    pub label: String,

    /// Free-form description, unbounded in length
    #[serde(default)]
    pub description: String,
}

impl Service {
    pub fn new(guid: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A plan belonging to a service offering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    /// Cloud Controller GUID
    pub guid: String,

    /// Plan name
    pub name: String,

    /// GUID of the owning service
    pub service_guid: String,

    /// Whether the plan is visible to all organizations
    #[serde(default)]
    pub public: bool,

    /// Free-form description, unbounded in length
    #[serde(default)]
    pub description: String,
}

impl ServicePlan {
    pub fn new(
        guid: impl Into<String>,
        name: impl Into<String>,
        service_guid: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            service_guid: service_guid.into(),
            public: true,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
