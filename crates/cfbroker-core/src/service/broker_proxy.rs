//! Broker proxy
//!
//! Maps each Open Service Broker operation onto one or two control-API calls.
//! Broker ids are names; the control API is GUID-keyed, so mutations first
//! resolve the name with an exact filter and then act on the GUID.
//!
//! Local state is two compute-once caches: the catalog and the default space
//! GUID. Both are filled by the first successful call and never invalidated.
//! A failed fill leaves the cache empty so the next call tries again.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::control_api::{ControlApi, CreateServiceInstanceRequest, Filter, FilterField};
use crate::domain::{
    BindDetails, Binding, DeprovisionDetails, DeprovisionServiceSpec, LastOperationStatus,
    Parameters, ProvisionDetails, ProvisionedServiceSpec, ServiceCatalogEntry, ServiceInstance,
    UnbindDetails, UpdateDetails, UpdateServiceSpec,
};
use crate::error::{BrokerError, BrokerResult};

/// Stateless-per-call adapter between the broker protocol and the control API
pub struct BrokerProxy {
    api: Arc<dyn ControlApi>,
    catalog: OnceCell<Vec<ServiceCatalogEntry>>,
    space_guid: OnceCell<String>,
}

impl BrokerProxy {
    pub fn new(api: Arc<dyn ControlApi>) -> Self {
        Self {
            api,
            catalog: OnceCell::new(),
            space_guid: OnceCell::new(),
        }
    }

    /// Space GUID new instances go to, if it has been resolved yet
    pub fn cached_space_guid(&self) -> Option<&str> {
        self.space_guid.get().map(String::as_str)
    }

    /// The broker catalog, built from the control API on first use
    pub async fn services(&self) -> BrokerResult<Vec<ServiceCatalogEntry>> {
        if let Some(catalog) = self.catalog.get() {
            debug!("[Broker] Catalog cache hit ({} services)", catalog.len());
            return Ok(catalog.clone());
        }

        let catalog = self
            .catalog
            .get_or_try_init(|| self.fetch_catalog())
            .await?;
        Ok(catalog.clone())
    }

    async fn fetch_catalog(&self) -> BrokerResult<Vec<ServiceCatalogEntry>> {
        info!("[Broker] Building catalog from control API");

        let services = self.api.get_services().await?.log_warnings("get_services");

        let mut catalog = Vec::with_capacity(services.len());
        for service in &services {
            let plans = self
                .api
                .get_service_plans(&[Filter::eq(FilterField::ServiceGuid, &service.guid)])
                .await?
                .log_warnings("get_service_plans");

            debug!(
                "[Broker] Service {} ({}) has {} plans",
                service.label,
                service.guid,
                plans.len()
            );
            catalog.push(ServiceCatalogEntry::from_service(service, &plans));
        }

        info!("[Broker] Catalog cached with {} services", catalog.len());
        Ok(catalog)
    }

    /// Create a CC instance named `instance_id` in the default space
    pub async fn provision(
        &self,
        instance_id: &str,
        details: &ProvisionDetails,
        async_allowed: bool,
    ) -> BrokerResult<ProvisionedServiceSpec> {
        info!(
            "[Broker] Provision instance={} plan={} async_allowed={}",
            instance_id, details.plan_id, async_allowed
        );
        if details.parameters.is_some() {
            debug!("[Broker] Provision parameters are not forwarded to the control API");
        }

        let space_guid = self.default_space_guid().await?;

        let instance = self
            .api
            .create_service_instance(CreateServiceInstanceRequest {
                name: instance_id.to_string(),
                service_plan_guid: details.plan_id.clone(),
                space_guid: space_guid.to_string(),
                accepts_incomplete: async_allowed,
                parameters: Parameters::new(),
            })
            .await?
            .log_warnings("create_service_instance");

        let is_async = instance.is_in_progress();
        info!(
            "[Broker] Instance {} created with guid={} async={}",
            instance_id, instance.guid, is_async
        );

        Ok(ProvisionedServiceSpec {
            dashboard_url: instance.dashboard_url,
            is_async,
            operation_data: instance.guid,
        })
    }

    async fn default_space_guid(&self) -> BrokerResult<&str> {
        let guid = self
            .space_guid
            .get_or_try_init(|| async {
                let spaces = self.api.get_spaces().await?.log_warnings("get_spaces");
                let space = spaces
                    .into_iter()
                    .next()
                    .ok_or(BrokerError::NoSpaceAvailable)?;
                info!("[Broker] Using space {} ({})", space.name, space.guid);
                Ok::<_, BrokerError>(space.guid)
            })
            .await?;
        Ok(guid.as_str())
    }

    /// Delete the CC instance named `instance_id`, asking for async completion
    pub async fn deprovision(
        &self,
        instance_id: &str,
        _details: &DeprovisionDetails,
        async_allowed: bool,
    ) -> BrokerResult<DeprovisionServiceSpec> {
        info!(
            "[Broker] Deprovision instance={} async_allowed={}",
            instance_id, async_allowed
        );

        let instance = self.find_instance_by_name(instance_id).await?;

        let deleted = self
            .api
            .delete_service_instance(&instance.guid, true, true)
            .await?
            .log_warnings("delete_service_instance");

        let spec = match deleted {
            Some(record) => DeprovisionServiceSpec {
                is_async: record.is_in_progress(),
                operation_data: record.guid,
            },
            None => DeprovisionServiceSpec {
                is_async: false,
                operation_data: instance.guid,
            },
        };

        info!(
            "[Broker] Instance {} deleted (async={})",
            instance_id, spec.is_async
        );
        Ok(spec)
    }

    /// Create a service key named `binding_id` on the instance named `instance_id`
    pub async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        _details: &BindDetails,
    ) -> BrokerResult<Binding> {
        info!("[Broker] Bind instance={} binding={}", instance_id, binding_id);

        let instance = self.find_instance_by_name(instance_id).await?;

        let key = self
            .api
            .create_service_key(&instance.guid, binding_id, true, Parameters::new())
            .await?
            .log_warnings("create_service_key");

        debug!("[Broker] Service key {} created ({})", key.name, key.guid);
        Ok(Binding {
            credentials: key.credentials,
        })
    }

    /// Delete the service key named `binding_id`.
    ///
    /// The lookup spans all keys visible to the control-API user, not only
    /// those of `instance_id`.
    pub async fn unbind(
        &self,
        instance_id: &str,
        binding_id: &str,
        _details: &UnbindDetails,
    ) -> BrokerResult<()> {
        info!(
            "[Broker] Unbind instance={} binding={}",
            instance_id, binding_id
        );

        let keys = self
            .api
            .get_service_keys(&[Filter::name(binding_id)])
            .await?
            .log_warnings("get_service_keys");

        if keys.len() > 1 {
            warn!(
                "[Broker] {} service keys named {}, deleting the first",
                keys.len(),
                binding_id
            );
        }
        let key = keys
            .into_iter()
            .next()
            .ok_or_else(|| BrokerError::ServiceKeyNotFound(binding_id.to_string()))?;

        self.api
            .delete_service_key(&key.guid, false)
            .await?
            .log_warnings("delete_service_key");

        debug!("[Broker] Service key {} deleted", key.guid);
        Ok(())
    }

    /// Status of the last operation on the instance whose GUID is `operation_data`
    pub async fn last_operation(
        &self,
        instance_id: &str,
        operation_data: &str,
    ) -> BrokerResult<LastOperationStatus> {
        debug!(
            "[Broker] LastOperation instance={} operation={}",
            instance_id, operation_data
        );

        let instance = if operation_data.is_empty() {
            // Platforms omit `operation` when the provision response had none
            self.find_instance_by_name(instance_id).await?
        } else {
            self.api
                .get_service_instance(operation_data)
                .await?
                .log_warnings("get_service_instance")
        };

        let (state, description) = instance.last_operation_or_succeeded();
        Ok(LastOperationStatus { state, description })
    }

    /// Plan changes are not supported; always succeeds without side effects
    pub async fn update(
        &self,
        instance_id: &str,
        _details: &UpdateDetails,
        _async_allowed: bool,
    ) -> BrokerResult<UpdateServiceSpec> {
        info!("[Broker] Update instance={} (no-op)", instance_id);
        Ok(UpdateServiceSpec::default())
    }

    /// Resolve a broker instance id (a CC name) to its CC record.
    ///
    /// Zero matches is an error; with several matches the first one wins.
    async fn find_instance_by_name(&self, name: &str) -> BrokerResult<ServiceInstance> {
        let instances = self
            .api
            .get_service_instances(&[Filter::name(name)])
            .await?
            .log_warnings("get_service_instances");

        if instances.len() > 1 {
            warn!(
                "[Broker] {} service instances named {}, using the first",
                instances.len(),
                name
            );
        }

        instances
            .into_iter()
            .next()
            .ok_or_else(|| BrokerError::InstanceNotFound(name.to_string()))
    }
}
