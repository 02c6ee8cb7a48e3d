//! Errors raised by control-API clients

use thiserror::Error;

/// Failure of a single control-API call.
///
/// The broker propagates these verbatim; it never retries or reclassifies.
#[derive(Debug, Error)]
pub enum ControlApiError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("Cloud Controller request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The Cloud Controller answered with a non-2xx status
    #[error("{}", format_status(.status, .error_code, .description))]
    Status {
        status: u16,
        error_code: Option<String>,
        description: String,
    },

    /// A 2xx response whose body did not match the expected shape
    #[error("Failed to decode Cloud Controller response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid Cloud Controller URL: {0}")]
    Url(#[from] url::ParseError),

    /// A filter value the `q` grammar cannot express
    #[error("Cannot filter on {field} '{value}': ',' and ';' are not allowed")]
    InvalidFilter { field: &'static str, value: String },

    /// Token acquisition against UAA failed
    #[error("Authentication failed: {0}")]
    Auth(String),
}

fn format_status(status: &u16, error_code: &Option<String>, description: &str) -> String {
    match error_code {
        Some(code) => format!("{} (HTTP {}, {})", description, status, code),
        None => format!("{} (HTTP {})", description, status),
    }
}

impl ControlApiError {
    /// HTTP status when the Cloud Controller rejected the call
    pub fn status(&self) -> Option<u16> {
        match self {
            ControlApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the Cloud Controller reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
