//! HTTP handlers for the OSB v2 routes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use cfbroker_core::{
    BindDetails, BrokerError, BrokerProxy, DeprovisionDetails, ProvisionDetails,
    ServiceCatalogEntry, UnbindDetails, UpdateDetails,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<BrokerProxy>,
}

impl AppState {
    pub fn new(proxy: Arc<BrokerProxy>) -> Self {
        Self { proxy }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    debug!("[Gateway] Health check");
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub services: Vec<ServiceCatalogEntry>,
}

/// `GET /v2/catalog`
pub async fn catalog(State(state): State<AppState>) -> Result<Json<CatalogResponse>, ApiError> {
    let services = state.proxy.services().await?;
    Ok(Json(CatalogResponse { services }))
}

/// `?accepts_incomplete=` on instance mutations
#[derive(Debug, Default, Deserialize)]
pub struct AsyncQuery {
    #[serde(default)]
    pub accepts_incomplete: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct OperationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn require_ids(service_id: &str, plan_id: &str) -> Result<(), ApiError> {
    if service_id.is_empty() {
        return Err(ApiError::bad_request("service_id is required"));
    }
    if plan_id.is_empty() {
        return Err(ApiError::bad_request("plan_id is required"));
    }
    Ok(())
}

/// `PUT /v2/service_instances/{instance_id}`
pub async fn provision(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    body: Result<Json<ProvisionDetails>, JsonRejection>,
) -> Result<Response, ApiError> {
    let details = json_body(body)?;
    require_ids(&details.service_id, &details.plan_id)?;

    let spec = state
        .proxy
        .provision(&instance_id, &details, query.accepts_incomplete)
        .await?;

    if spec.is_async {
        let body = OperationResponse {
            dashboard_url: spec.dashboard_url,
            operation: Some(spec.operation_data),
        };
        Ok((StatusCode::ACCEPTED, Json(body)).into_response())
    } else {
        let body = OperationResponse {
            dashboard_url: spec.dashboard_url,
            operation: None,
        };
        Ok((StatusCode::CREATED, Json(body)).into_response())
    }
}

/// `PATCH /v2/service_instances/{instance_id}`
pub async fn update(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    body: Result<Json<UpdateDetails>, JsonRejection>,
) -> Result<Response, ApiError> {
    let details = json_body(body)?;
    let spec = state
        .proxy
        .update(&instance_id, &details, query.accepts_incomplete)
        .await?;

    if spec.is_async {
        let body = OperationResponse {
            dashboard_url: None,
            operation: Some(spec.operation_data),
        };
        Ok((StatusCode::ACCEPTED, Json(body)).into_response())
    } else {
        Ok((StatusCode::OK, Json(json!({}))).into_response())
    }
}

/// `DELETE /v2/service_instances/{instance_id}`
pub async fn deprovision(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    Query(details): Query<DeprovisionDetails>,
) -> Result<Response, ApiError> {
    let spec = match state
        .proxy
        .deprovision(&instance_id, &details, query.accepts_incomplete)
        .await
    {
        Ok(spec) => spec,
        Err(BrokerError::InstanceNotFound(_)) => {
            info!("[Gateway] Deprovision of unknown instance {}", instance_id);
            return Err(ApiError::gone());
        }
        Err(e) => return Err(e.into()),
    };

    if spec.is_async {
        let body = OperationResponse {
            dashboard_url: None,
            operation: Some(spec.operation_data),
        };
        Ok((StatusCode::ACCEPTED, Json(body)).into_response())
    } else {
        Ok((StatusCode::OK, Json(json!({}))).into_response())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LastOperationQuery {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// `GET /v2/service_instances/{instance_id}/last_operation`
pub async fn last_operation(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<LastOperationQuery>,
) -> Result<Response, ApiError> {
    let operation = query.operation.unwrap_or_default();

    match state.proxy.last_operation(&instance_id, &operation).await {
        Ok(status) => Ok((StatusCode::OK, Json(status)).into_response()),
        Err(BrokerError::Upstream(e)) if e.is_not_found() => {
            info!("[Gateway] Instance {} is gone", instance_id);
            Err(ApiError::gone())
        }
        Err(BrokerError::InstanceNotFound(_)) => Err(ApiError::gone()),
        Err(e) => Err(e.into()),
    }
}

/// `PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
pub async fn bind(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    body: Result<Json<BindDetails>, JsonRejection>,
) -> Result<Response, ApiError> {
    let details = json_body(body)?;
    require_ids(&details.service_id, &details.plan_id)?;

    let binding = state
        .proxy
        .bind(&instance_id, &binding_id, &details)
        .await?;

    Ok((StatusCode::CREATED, Json(binding)).into_response())
}

/// `DELETE /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
pub async fn unbind(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(details): Query<UnbindDetails>,
) -> Result<Response, ApiError> {
    match state
        .proxy
        .unbind(&instance_id, &binding_id, &details)
        .await
    {
        Ok(()) => Ok((StatusCode::OK, Json(json!({}))).into_response()),
        Err(BrokerError::ServiceKeyNotFound(_)) => {
            info!("[Gateway] Unbind of unknown binding {}", binding_id);
            Err(ApiError::gone())
        }
        Err(e) => Err(e.into()),
    }
}
