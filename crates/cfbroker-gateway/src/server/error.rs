//! OSB error responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use cfbroker_core::{branding, BrokerError, ControlApiError};
use serde::Serialize;
use tracing::{error, warn};

/// OSB error body: `{"description"}`, or `{}` for 410 Gone
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A status code plus OSB error body, returned by handlers and middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                description: Some(description.into()),
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, description)
    }

    pub fn precondition_failed(description: impl Into<String>) -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, description)
    }

    /// 410 with an empty body
    pub fn gone() -> Self {
        Self {
            status: StatusCode::GONE,
            body: ErrorBody::default(),
        }
    }

    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, description)
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match &err {
            BrokerError::InstanceNotFound(_) | BrokerError::ServiceKeyNotFound(_) => {
                warn!("[Gateway] {}", err);
                ApiError::new(StatusCode::NOT_FOUND, err.to_string())
            }
            // caller-supplied id the CC cannot be queried with
            BrokerError::Upstream(ControlApiError::InvalidFilter { .. }) => {
                warn!("[Gateway] {}", err);
                ApiError::bad_request(err.to_string())
            }
            BrokerError::NoSpaceAvailable | BrokerError::Upstream(_) => {
                error!("[Gateway] Broker operation failed: {}", err);
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            let challenge = format!("Basic realm=\"{}\"", branding::IDENTIFIER);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}
