//! Service key - the Cloud Controller record backing a broker binding

use serde::{Deserialize, Serialize};

use super::Credentials;

/// A set of credentials for one service instance.
///
/// The broker uses the OSB binding id as the key `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceKey {
    pub guid: String,
    pub name: String,
    pub service_instance_guid: String,
    #[serde(default)]
    pub credentials: Credentials,
}

impl ServiceKey {
    pub fn new(
        guid: impl Into<String>,
        name: impl Into<String>,
        service_instance_guid: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            service_instance_guid: service_instance_guid.into(),
            credentials: Credentials::new(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}
