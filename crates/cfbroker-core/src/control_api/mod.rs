//! Control-API abstraction
//!
//! This trait defines the subset of the Cloud Controller v2 API the broker
//! needs, without specifying the transport. `CloudControllerClient` is the
//! HTTP implementation; tests use in-memory stubs.

mod error;
mod filter;

pub use error::ControlApiError;
pub use filter::{Filter, FilterField, FilterOperator};

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Parameters, Service, ServiceInstance, ServiceKey, ServicePlan, Space};

/// Warnings returned alongside a successful call (`X-Cf-Warnings`)
pub type Warnings = Vec<String>;

/// A control-API value together with the warnings the call produced
#[derive(Debug, Clone, PartialEq)]
pub struct Warned<T> {
    pub value: T,
    pub warnings: Warnings,
}

impl<T> Warned<T> {
    pub fn new(value: T, warnings: Warnings) -> Self {
        Self { value, warnings }
    }

    /// Log any warnings against `operation` and return the value
    pub fn log_warnings(self, operation: &str) -> T {
        for warning in &self.warnings {
            warn!("[ControlApi] {} warning: {}", operation, warning);
        }
        self.value
    }
}

/// Result type for control-API operations
pub type ControlResult<T> = Result<Warned<T>, ControlApiError>;

/// Arguments of a service instance creation
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServiceInstanceRequest {
    pub name: String,
    pub service_plan_guid: String,
    pub space_guid: String,
    pub accepts_incomplete: bool,
    pub parameters: Parameters,
}

/// Control-API client trait
///
/// List methods page through the full result set transparently.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Get all services
    async fn get_services(&self) -> ControlResult<Vec<Service>>;

    /// Get service plans matching all filters
    async fn get_service_plans(&self, filters: &[Filter]) -> ControlResult<Vec<ServicePlan>>;

    /// Get all spaces visible to the authenticated user
    async fn get_spaces(&self) -> ControlResult<Vec<Space>>;

    /// Get service instances matching all filters
    async fn get_service_instances(
        &self,
        filters: &[Filter],
    ) -> ControlResult<Vec<ServiceInstance>>;

    /// Get a service instance by GUID
    async fn get_service_instance(&self, guid: &str) -> ControlResult<ServiceInstance>;

    /// Create a service instance
    async fn create_service_instance(
        &self,
        request: CreateServiceInstanceRequest,
    ) -> ControlResult<ServiceInstance>;

    /// Delete a service instance.
    ///
    /// Returns the updated record when the CC answers with one (asynchronous
    /// deletion), `None` when it answers 204 No Content.
    async fn delete_service_instance(
        &self,
        guid: &str,
        accepts_incomplete: bool,
        run_async: bool,
    ) -> ControlResult<Option<ServiceInstance>>;

    /// Get service keys matching all filters
    async fn get_service_keys(&self, filters: &[Filter]) -> ControlResult<Vec<ServiceKey>>;

    /// Create a service key on an instance
    async fn create_service_key(
        &self,
        service_instance_guid: &str,
        name: &str,
        accepts_incomplete: bool,
        parameters: Parameters,
    ) -> ControlResult<ServiceKey>;

    /// Delete a service key
    async fn delete_service_key(&self, guid: &str, accepts_incomplete: bool) -> ControlResult<()>;
}
