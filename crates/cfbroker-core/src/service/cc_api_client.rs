//! HTTP client for the Cloud Controller v2 API.
//!
//! Implements `ControlApi` over REST. List endpoints are paged through by
//! following `next_url`; every response's `X-Cf-Warnings` header is collected
//! and returned with the value.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::uaa_token::{TokenSource, UaaTokenProvider};
use crate::branding;
use crate::control_api::{
    ControlApi, ControlApiError, ControlResult, CreateServiceInstanceRequest, Filter, Warned,
    Warnings,
};
use crate::domain::{
    Credentials, LastOperation, Parameters, Service, ServiceInstance, ServiceKey, ServicePlan,
    Space,
};

const WARNINGS_HEADER: &str = "X-Cf-Warnings";

// ============================================
// Wire Types
// ============================================

#[derive(Debug, Deserialize)]
struct Metadata {
    guid: String,
}

/// `{metadata, entity}` envelope every CC v2 resource comes in
#[derive(Debug, Deserialize)]
struct Resource<E> {
    metadata: Metadata,
    entity: E,
}

/// One page of a list response
#[derive(Debug, Deserialize)]
struct Page<E> {
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default = "Vec::new")]
    resources: Vec<Resource<E>>,
}

/// Conversion from a wire envelope into a domain record
trait FromResource<E>: Sized {
    fn from_resource(r: Resource<E>) -> Self;
}

#[derive(Debug, Deserialize)]
struct CcErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntity {
    label: String,
    #[serde(default)]
    description: Option<String>,
}

impl FromResource<ServiceEntity> for Service {
    fn from_resource(r: Resource<ServiceEntity>) -> Self {
        Service {
            guid: r.metadata.guid,
            label: r.entity.label,
            description: r.entity.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServicePlanEntity {
    name: String,
    #[serde(default)]
    service_guid: String,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    description: Option<String>,
}

impl FromResource<ServicePlanEntity> for ServicePlan {
    fn from_resource(r: Resource<ServicePlanEntity>) -> Self {
        ServicePlan {
            guid: r.metadata.guid,
            name: r.entity.name,
            service_guid: r.entity.service_guid,
            public: r.entity.public,
            description: r.entity.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpaceEntity {
    name: String,
    #[serde(default)]
    organization_guid: String,
}

impl FromResource<SpaceEntity> for Space {
    fn from_resource(r: Resource<SpaceEntity>) -> Self {
        Space {
            guid: r.metadata.guid,
            name: r.entity.name,
            organization_guid: r.entity.organization_guid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceInstanceEntity {
    name: String,
    #[serde(default)]
    space_guid: String,
    #[serde(default)]
    service_plan_guid: String,
    #[serde(default)]
    dashboard_url: Option<String>,
    #[serde(default)]
    last_operation: Option<LastOperation>,
}

impl FromResource<ServiceInstanceEntity> for ServiceInstance {
    fn from_resource(r: Resource<ServiceInstanceEntity>) -> Self {
        ServiceInstance {
            guid: r.metadata.guid,
            name: r.entity.name,
            space_guid: r.entity.space_guid,
            service_plan_guid: r.entity.service_plan_guid,
            dashboard_url: r.entity.dashboard_url,
            last_operation: r.entity.last_operation,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceKeyEntity {
    name: String,
    #[serde(default)]
    service_instance_guid: String,
    #[serde(default)]
    credentials: Option<Credentials>,
}

impl FromResource<ServiceKeyEntity> for ServiceKey {
    fn from_resource(r: Resource<ServiceKeyEntity>) -> Self {
        ServiceKey {
            guid: r.metadata.guid,
            name: r.entity.name,
            service_instance_guid: r.entity.service_instance_guid,
            credentials: r.entity.credentials.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateServiceInstanceBody<'a> {
    name: &'a str,
    service_plan_guid: &'a str,
    space_guid: &'a str,
    parameters: &'a Parameters,
}

#[derive(Debug, Serialize)]
struct CreateServiceKeyBody<'a> {
    service_instance_guid: &'a str,
    name: &'a str,
    parameters: &'a Parameters,
}

// ============================================
// Client Implementation
// ============================================

/// Settings for `CloudControllerClient`
#[derive(Debug, Clone)]
pub struct CloudControllerConfig {
    /// Base URL, e.g. `https://api.sys.example.com`
    pub api_url: Url,
    pub token_source: TokenSource,
    /// Accept self-signed certificates
    pub skip_ssl_validation: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Cloud Controller v2 REST client
pub struct CloudControllerClient {
    api_url: Url,
    http: reqwest::Client,
    tokens: UaaTokenProvider,
}

impl CloudControllerClient {
    /// Create a new Cloud Controller client
    pub fn new(config: CloudControllerConfig) -> Result<Self, ControlApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(branding::user_agent())
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()?;

        let tokens = UaaTokenProvider::new(http.clone(), config.api_url.clone(), config.token_source);

        Ok(Self {
            api_url: config.api_url,
            http,
            tokens,
        })
    }

    /// Get the base URL
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn url(&self, path: &str) -> Result<Url, ControlApiError> {
        Ok(join_under(&self.api_url, path)?)
    }

    /// Authenticate, send, collect warnings and turn non-2xx into errors
    async fn send(&self, request: RequestBuilder) -> Result<(Response, Warnings), ControlApiError> {
        let token = self.tokens.access_token().await?;

        let response = request
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let warnings = parse_warnings(response.headers());
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        Ok((response, warnings))
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, ControlApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ControlApiError::Decode {
            context: context.to_string(),
            source,
        })
    }

    /// GET every page of a list endpoint
    async fn list<E, T>(&self, path: &str, filters: &[Filter]) -> ControlResult<Vec<T>>
    where
        E: DeserializeOwned,
        T: FromResource<E>,
    {
        let query = Filter::to_query_pairs(filters)?;
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut items = Vec::new();
        let mut warnings = Vec::new();
        let mut next = Some(url);

        while let Some(page_url) = next.take() {
            debug!("[CC] GET {}", page_url);
            let (response, page_warnings) = self.send(self.http.get(page_url)).await?;
            warnings.extend(page_warnings);

            let page: Page<E> = Self::decode(response, path).await?;
            items.extend(page.resources.into_iter().map(T::from_resource));

            next = match page.next_url {
                Some(next_url) => Some(self.url(&next_url)?),
                None => None,
            };
        }

        Ok(Warned::new(items, warnings))
    }

    /// Decode a single resource body, or `None` for an empty one
    async fn decode_optional<E, T>(response: Response, context: &str) -> Result<Option<T>, ControlApiError>
    where
        E: DeserializeOwned,
        T: FromResource<E>,
    {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let resource: Resource<E> =
            serde_json::from_slice(&bytes).map_err(|source| ControlApiError::Decode {
                context: context.to_string(),
                source,
            })?;
        Ok(Some(T::from_resource(resource)))
    }
}

#[async_trait]
impl ControlApi for CloudControllerClient {
    async fn get_services(&self) -> ControlResult<Vec<Service>> {
        self.list::<ServiceEntity, Service>("/v2/services", &[]).await
    }

    async fn get_service_plans(&self, filters: &[Filter]) -> ControlResult<Vec<ServicePlan>> {
        self.list::<ServicePlanEntity, ServicePlan>("/v2/service_plans", filters)
            .await
    }

    async fn get_spaces(&self) -> ControlResult<Vec<Space>> {
        self.list::<SpaceEntity, Space>("/v2/spaces", &[]).await
    }

    async fn get_service_instances(
        &self,
        filters: &[Filter],
    ) -> ControlResult<Vec<ServiceInstance>> {
        self.list::<ServiceInstanceEntity, ServiceInstance>("/v2/service_instances", filters)
            .await
    }

    async fn get_service_instance(&self, guid: &str) -> ControlResult<ServiceInstance> {
        let url = self.url(&format!(
            "/v2/service_instances/{}",
            urlencoding::encode(guid)
        ))?;
        debug!("[CC] GET {}", url);

        let (response, warnings) = self.send(self.http.get(url)).await?;
        let resource: Resource<ServiceInstanceEntity> =
            Self::decode(response, "service instance").await?;
        Ok(Warned::new(ServiceInstance::from_resource(resource), warnings))
    }

    async fn create_service_instance(
        &self,
        request: CreateServiceInstanceRequest,
    ) -> ControlResult<ServiceInstance> {
        let url = self.url("/v2/service_instances")?;
        let body = CreateServiceInstanceBody {
            name: &request.name,
            service_plan_guid: &request.service_plan_guid,
            space_guid: &request.space_guid,
            parameters: &request.parameters,
        };
        debug!("[CC] POST {} name={}", url, request.name);

        let (response, warnings) = self
            .send(
                self.http
                    .post(url)
                    .query(&[("accepts_incomplete", request.accepts_incomplete)])
                    .json(&body),
            )
            .await?;
        let resource: Resource<ServiceInstanceEntity> =
            Self::decode(response, "created service instance").await?;
        Ok(Warned::new(ServiceInstance::from_resource(resource), warnings))
    }

    async fn delete_service_instance(
        &self,
        guid: &str,
        accepts_incomplete: bool,
        run_async: bool,
    ) -> ControlResult<Option<ServiceInstance>> {
        let url = self.url(&format!(
            "/v2/service_instances/{}",
            urlencoding::encode(guid)
        ))?;
        debug!("[CC] DELETE {}", url);

        let (response, warnings) = self
            .send(self.http.delete(url).query(&[
                ("accepts_incomplete", accepts_incomplete),
                ("async", run_async),
            ]))
            .await?;
        let deleted = Self::decode_optional::<ServiceInstanceEntity, ServiceInstance>(
            response,
            "deleted service instance",
        )
        .await?;
        Ok(Warned::new(deleted, warnings))
    }

    async fn get_service_keys(&self, filters: &[Filter]) -> ControlResult<Vec<ServiceKey>> {
        self.list::<ServiceKeyEntity, ServiceKey>("/v2/service_keys", filters)
            .await
    }

    async fn create_service_key(
        &self,
        service_instance_guid: &str,
        name: &str,
        accepts_incomplete: bool,
        parameters: Parameters,
    ) -> ControlResult<ServiceKey> {
        let url = self.url("/v2/service_keys")?;
        let body = CreateServiceKeyBody {
            service_instance_guid,
            name,
            parameters: &parameters,
        };
        debug!("[CC] POST {} name={}", url, name);

        let (response, warnings) = self
            .send(
                self.http
                    .post(url)
                    .query(&[("accepts_incomplete", accepts_incomplete)])
                    .json(&body),
            )
            .await?;
        let resource: Resource<ServiceKeyEntity> =
            Self::decode(response, "created service key").await?;
        Ok(Warned::new(ServiceKey::from_resource(resource), warnings))
    }

    async fn delete_service_key(&self, guid: &str, accepts_incomplete: bool) -> ControlResult<()> {
        let url = self.url(&format!("/v2/service_keys/{}", urlencoding::encode(guid)))?;
        debug!("[CC] DELETE {}", url);

        let (_response, warnings) = self
            .send(
                self.http
                    .delete(url)
                    .query(&[("accepts_incomplete", accepts_incomplete)]),
            )
            .await?;
        Ok(Warned::new((), warnings))
    }
}

/// Resolve an API path against `base` without dropping the path prefix
/// `base` may carry (e.g. `https://host/cf`). Paths that already start with
/// that prefix, as `next_url` does behind some routers, are not doubled.
pub(crate) fn join_under(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let prefix = base.path().trim_end_matches('/');
    let relative = match path.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && rest.starts_with('/') => rest,
        _ => path,
    };

    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let with_slash = format!("{}/", root.path());
        root.set_path(&with_slash);
    }
    root.join(relative.trim_start_matches('/'))
}

/// Split and URL-decode every `X-Cf-Warnings` header value
fn parse_warnings(headers: &HeaderMap) -> Warnings {
    headers
        .get_all(WARNINGS_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            urlencoding::decode(w)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| w.to_string())
        })
        .collect()
}

/// Build a status error from a CC error body, falling back to the raw text
fn status_error(status: StatusCode, body: &str) -> ControlApiError {
    let parsed = serde_json::from_str::<CcErrorBody>(body).ok();
    let error_code = parsed.as_ref().and_then(|b| b.error_code.clone());
    let description = parsed
        .and_then(|b| b.description)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    ControlApiError::Status {
        status: status.as_u16(),
        error_code,
        description,
    }
}
