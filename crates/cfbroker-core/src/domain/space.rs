//! Space record - the grouping new instances are created under

use serde::{Deserialize, Serialize};

/// A Cloud Controller space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub organization_guid: String,
}

impl Space {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            organization_guid: String::new(),
        }
    }
}
