//! In-memory control API for broker tests
//!
//! Holds services, plans, spaces, instances and keys in memory, counts every
//! call by operation name, and can be told to fail an operation with an HTTP
//! status.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

use cfbroker_core::{
    ControlApi, ControlApiError, ControlResult, CreateServiceInstanceRequest, Filter,
    FilterField, LastOperation, LastOperationState, Parameters, Service, ServiceInstance,
    ServiceKey, ServicePlan, Space, Warned,
};

/// Operation names used for call counting and failure injection
pub mod ops {
    pub const GET_SERVICES: &str = "get_services";
    pub const GET_SERVICE_PLANS: &str = "get_service_plans";
    pub const GET_SPACES: &str = "get_spaces";
    pub const GET_SERVICE_INSTANCES: &str = "get_service_instances";
    pub const GET_SERVICE_INSTANCE: &str = "get_service_instance";
    pub const CREATE_SERVICE_INSTANCE: &str = "create_service_instance";
    pub const DELETE_SERVICE_INSTANCE: &str = "delete_service_instance";
    pub const GET_SERVICE_KEYS: &str = "get_service_keys";
    pub const CREATE_SERVICE_KEY: &str = "create_service_key";
    pub const DELETE_SERVICE_KEY: &str = "delete_service_key";

    pub const MUTATIONS: &[&str] = &[
        CREATE_SERVICE_INSTANCE,
        DELETE_SERVICE_INSTANCE,
        CREATE_SERVICE_KEY,
        DELETE_SERVICE_KEY,
    ];
}

#[derive(Default)]
pub struct StubControlApi {
    services: RwLock<Vec<Service>>,
    plans: RwLock<Vec<ServicePlan>>,
    spaces: RwLock<Vec<Space>>,
    instances: RwLock<Vec<ServiceInstance>>,
    keys: RwLock<Vec<ServiceKey>>,
    calls: RwLock<HashMap<&'static str, usize>>,
    failures: RwLock<HashMap<&'static str, u16>>,
    /// Last-operation state stamped on created instances
    create_state: RwLock<Option<LastOperationState>>,
    /// Deletes answer with an in-progress record instead of 204
    async_delete: RwLock<bool>,
    latency: RwLock<Option<Duration>>,
    warnings: RwLock<Vec<String>>,
    last_create: RwLock<Option<CreateServiceInstanceRequest>>,
    /// Dashboard URL stamped on created instances
    create_dashboard_url: RwLock<Option<String>>,
}

impl StubControlApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, service: Service) -> Self {
        self.services.write().unwrap().push(service);
        self
    }

    pub fn with_plan(self, plan: ServicePlan) -> Self {
        self.plans.write().unwrap().push(plan);
        self
    }

    pub fn with_space(self, space: Space) -> Self {
        self.spaces.write().unwrap().push(space);
        self
    }

    pub fn with_instance(self, instance: ServiceInstance) -> Self {
        self.instances.write().unwrap().push(instance);
        self
    }

    pub fn with_key(self, key: ServiceKey) -> Self {
        self.keys.write().unwrap().push(key);
        self
    }

    pub fn with_create_state(self, state: LastOperationState) -> Self {
        *self.create_state.write().unwrap() = Some(state);
        self
    }

    pub fn with_create_dashboard_url(self, url: impl Into<String>) -> Self {
        *self.create_dashboard_url.write().unwrap() = Some(url.into());
        self
    }

    pub fn with_async_delete(self) -> Self {
        *self.async_delete.write().unwrap() = true;
        self
    }

    /// Delay every call, so concurrent callers overlap
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.write().unwrap() = Some(latency);
        self
    }

    pub fn with_warning(self, warning: impl Into<String>) -> Self {
        self.warnings.write().unwrap().push(warning.into());
        self
    }

    /// Make `op` fail with an HTTP `status` until cleared
    pub fn fail(&self, op: &'static str, status: u16) {
        self.failures.write().unwrap().insert(op, status);
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.failures.write().unwrap().remove(op);
    }

    /// Number of calls made to `op`
    pub fn calls(&self, op: &str) -> usize {
        self.calls.read().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Total calls across all operations
    pub fn total_calls(&self) -> usize {
        self.calls.read().unwrap().values().sum()
    }

    /// Calls to operations that change CC state
    pub fn mutating_calls(&self) -> usize {
        ops::MUTATIONS.iter().map(|op| self.calls(op)).sum()
    }

    pub fn instances(&self) -> Vec<ServiceInstance> {
        self.instances.read().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.keys.read().unwrap().clone()
    }

    pub fn last_create(&self) -> Option<CreateServiceInstanceRequest> {
        self.last_create.read().unwrap().clone()
    }

    async fn enter(&self, op: &'static str) -> Result<Vec<String>, ControlApiError> {
        *self.calls.write().unwrap().entry(op).or_insert(0) += 1;

        let latency = *self.latency.read().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failures.read().unwrap().get(op).copied();
        if let Some(status) = failure {
            return Err(status_error(status, format!("{} failed", op)));
        }
        Ok(self.warnings.read().unwrap().clone())
    }
}

pub fn status_error(status: u16, description: impl Into<String>) -> ControlApiError {
    ControlApiError::Status {
        status,
        error_code: None,
        description: description.into(),
    }
}

/// First value filtered on for `field`, rejecting filters the HTTP client would
fn filter_value(filters: &[Filter], field: FilterField) -> Result<Option<&str>, ControlApiError> {
    Filter::to_query_pairs(filters)?;
    Ok(filters
        .iter()
        .find(|f| f.field == field)
        .and_then(|f| f.values.first())
        .map(String::as_str))
}

#[async_trait]
impl ControlApi for StubControlApi {
    async fn get_services(&self) -> ControlResult<Vec<Service>> {
        let warnings = self.enter(ops::GET_SERVICES).await?;
        Ok(Warned::new(self.services.read().unwrap().clone(), warnings))
    }

    async fn get_service_plans(&self, filters: &[Filter]) -> ControlResult<Vec<ServicePlan>> {
        let warnings = self.enter(ops::GET_SERVICE_PLANS).await?;
        let service_guid = filter_value(filters, FilterField::ServiceGuid)?;
        let plans = self
            .plans
            .read()
            .unwrap()
            .iter()
            .filter(|p| service_guid.map_or(true, |g| p.service_guid == g))
            .cloned()
            .collect();
        Ok(Warned::new(plans, warnings))
    }

    async fn get_spaces(&self) -> ControlResult<Vec<Space>> {
        let warnings = self.enter(ops::GET_SPACES).await?;
        Ok(Warned::new(self.spaces.read().unwrap().clone(), warnings))
    }

    async fn get_service_instances(
        &self,
        filters: &[Filter],
    ) -> ControlResult<Vec<ServiceInstance>> {
        let warnings = self.enter(ops::GET_SERVICE_INSTANCES).await?;
        let name = filter_value(filters, FilterField::Name)?;
        let instances = self
            .instances
            .read()
            .unwrap()
            .iter()
            .filter(|i| name.map_or(true, |n| i.name == n))
            .cloned()
            .collect();
        Ok(Warned::new(instances, warnings))
    }

    async fn get_service_instance(&self, guid: &str) -> ControlResult<ServiceInstance> {
        let warnings = self.enter(ops::GET_SERVICE_INSTANCE).await?;
        let instance = self
            .instances
            .read()
            .unwrap()
            .iter()
            .find(|i| i.guid == guid)
            .cloned()
            .ok_or_else(|| status_error(404, format!("The service instance could not be found: {}", guid)))?;
        Ok(Warned::new(instance, warnings))
    }

    async fn create_service_instance(
        &self,
        request: CreateServiceInstanceRequest,
    ) -> ControlResult<ServiceInstance> {
        let warnings = self.enter(ops::CREATE_SERVICE_INSTANCE).await?;

        let mut instance = ServiceInstance::new(Uuid::new_v4().to_string(), request.name.clone());
        instance.space_guid = request.space_guid.clone();
        instance.service_plan_guid = request.service_plan_guid.clone();
        if let Some(state) = *self.create_state.read().unwrap() {
            instance = instance.with_last_operation(LastOperation::new("create", state));
        }
        if let Some(url) = self.create_dashboard_url.read().unwrap().clone() {
            instance = instance.with_dashboard_url(url);
        }

        self.instances.write().unwrap().push(instance.clone());
        *self.last_create.write().unwrap() = Some(request);
        Ok(Warned::new(instance, warnings))
    }

    async fn delete_service_instance(
        &self,
        guid: &str,
        _accepts_incomplete: bool,
        _run_async: bool,
    ) -> ControlResult<Option<ServiceInstance>> {
        let warnings = self.enter(ops::DELETE_SERVICE_INSTANCE).await?;

        let mut instances = self.instances.write().unwrap();
        let idx = instances
            .iter()
            .position(|i| i.guid == guid)
            .ok_or_else(|| status_error(404, "instance not found"))?;

        if *self.async_delete.read().unwrap() {
            let record = instances[idx]
                .clone()
                .with_last_operation(LastOperation::new("delete", LastOperationState::InProgress));
            instances[idx] = record.clone();
            Ok(Warned::new(Some(record), warnings))
        } else {
            instances.remove(idx);
            Ok(Warned::new(None, warnings))
        }
    }

    async fn get_service_keys(&self, filters: &[Filter]) -> ControlResult<Vec<ServiceKey>> {
        let warnings = self.enter(ops::GET_SERVICE_KEYS).await?;
        let name = filter_value(filters, FilterField::Name)?;
        let keys = self
            .keys
            .read()
            .unwrap()
            .iter()
            .filter(|k| name.map_or(true, |n| k.name == n))
            .cloned()
            .collect();
        Ok(Warned::new(keys, warnings))
    }

    async fn create_service_key(
        &self,
        service_instance_guid: &str,
        name: &str,
        _accepts_incomplete: bool,
        _parameters: Parameters,
    ) -> ControlResult<ServiceKey> {
        let warnings = self.enter(ops::CREATE_SERVICE_KEY).await?;

        let mut credentials = serde_json::Map::new();
        credentials.insert(
            "uri".to_string(),
            serde_json::Value::String(format!("stub://{}/{}", service_instance_guid, name)),
        );
        let key = ServiceKey::new(Uuid::new_v4().to_string(), name, service_instance_guid)
            .with_credentials(credentials);

        self.keys.write().unwrap().push(key.clone());
        Ok(Warned::new(key, warnings))
    }

    async fn delete_service_key(&self, guid: &str, _accepts_incomplete: bool) -> ControlResult<()> {
        let warnings = self.enter(ops::DELETE_SERVICE_KEY).await?;

        let mut keys = self.keys.write().unwrap();
        let idx = keys
            .iter()
            .position(|k| k.guid == guid)
            .ok_or_else(|| status_error(404, "service key not found"))?;
        keys.remove(idx);
        Ok(Warned::new((), warnings))
    }
}
