//! Broker-level errors

use thiserror::Error;

use crate::control_api::ControlApiError;

/// Why a broker operation failed.
///
/// The HTTP layer maps each variant to a status code; this crate never does.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Name lookup for an instance returned nothing
    #[error("Service instance with name {0} not found")]
    InstanceNotFound(String),

    /// Name lookup for a service key returned nothing
    #[error("Service key '{0}' not found")]
    ServiceKeyNotFound(String),

    /// Provision needs a space and the CC returned none
    #[error("Available spaces not found")]
    NoSpaceAvailable,

    /// Any control-API failure, passed through unchanged
    #[error(transparent)]
    Upstream(#[from] ControlApiError),
}

impl BrokerError {
    /// Lookup errors, as opposed to preconditions or upstream failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BrokerError::InstanceNotFound(_) | BrokerError::ServiceKeyNotFound(_)
        )
    }
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;
