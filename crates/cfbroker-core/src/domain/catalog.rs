//! Broker catalog - what the platform marketplace sees

use serde::{Deserialize, Serialize};

use super::{Service, ServicePlan};
use crate::branding::MAX_DESCRIPTION_CHARS;

/// One service offering in the broker catalog (OSB `services[]` element)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    /// OSB spells it `plan_updateable`
    #[serde(rename = "plan_updateable")]
    pub plan_updatable: bool,
    pub plans: Vec<PlanEntry>,
}

impl ServiceCatalogEntry {
    /// Build a catalog entry from a CC service and its plans.
    ///
    /// Every entry is bindable and never plan-updatable; descriptions are
    /// cut to the platform limit.
    pub fn from_service(service: &Service, plans: &[ServicePlan]) -> Self {
        Self {
            id: service.guid.clone(),
            name: service.label.clone(),
            description: truncate_description(&service.description),
            bindable: true,
            plan_updatable: false,
            plans: plans.iter().map(PlanEntry::from_plan).collect(),
        }
    }
}

/// One plan of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl PlanEntry {
    pub fn from_plan(plan: &ServicePlan) -> Self {
        Self {
            id: plan.guid.clone(),
            name: plan.name.clone(),
            description: truncate_description(&plan.description),
        }
    }
}

/// Cut a description to at most 254 characters, on a char boundary
pub fn truncate_description(original: &str) -> String {
    match original.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((byte_idx, _)) => original[..byte_idx].to_string(),
        None => original.to_string(),
    }
}
