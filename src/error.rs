use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Only POST requests are allowed.")]
    MethodNotAllowed(String),

    #[error("Configuration error: {0}")]
    MissingConfiguration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Upstream error: {status} - {body}")]
    UpstreamError { status: u16, body: String },

    #[error("API response error: no image was generated.")]
    EmptyResult,

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse classification of a [`GatewayError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MethodNotAllowed,
    MissingConfiguration,
    InvalidRequest,
    AuthenticationFailure,
    UpstreamError,
    EmptyResult,
    InternalError,
}

/// JSON body written for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            GatewayError::MissingConfiguration(_) => ErrorKind::MissingConfiguration,
            GatewayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GatewayError::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
            GatewayError::UpstreamError { .. } => ErrorKind::UpstreamError,
            GatewayError::EmptyResult => ErrorKind::EmptyResult,
            GatewayError::InternalError(_) => ErrorKind::InternalError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::MethodNotAllowed(_) => 405,
            GatewayError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Status code reported by the provider, when the failure came from it.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            GatewayError::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            GatewayError::MethodNotAllowed(_) | GatewayError::EmptyResult => ErrorBody {
                error: self.to_string(),
                details: None,
            },
            GatewayError::MissingConfiguration(msg) => ErrorBody {
                error: "Server configuration is incomplete.".to_string(),
                details: Some(msg.clone()),
            },
            GatewayError::InvalidRequest(msg) => ErrorBody {
                error: msg.clone(),
                details: None,
            },
            GatewayError::AuthenticationFailure(_)
            | GatewayError::UpstreamError { .. }
            | GatewayError::InternalError(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: Some(self.to_string()),
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::InternalError(format!("Provider request failed: {}", err.without_url()))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::MethodNotAllowed("GET".into()).status_code(), 405);
        assert_eq!(GatewayError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(GatewayError::MissingConfiguration("x".into()).status_code(), 500);
        assert_eq!(GatewayError::AuthenticationFailure("x".into()).status_code(), 500);
        assert_eq!(GatewayError::EmptyResult.status_code(), 500);
        assert_eq!(GatewayError::InternalError("x".into()).status_code(), 500);
        assert_eq!(
            GatewayError::UpstreamError {
                status: 429,
                body: "quota".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_upstream_details_carry_provider_status() {
        let err = GatewayError::UpstreamError {
            status: 503,
            body: "backend unavailable".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.provider_status(), Some(503));

        let body = err.to_body();
        assert_eq!(body.error, "Internal server error");
        let details = body.details.unwrap();
        assert!(details.contains("503"));
        assert!(details.contains("backend unavailable"));
    }

    #[test]
    fn test_error_body_omits_empty_details() {
        let json = serde_json::to_value(GatewayError::EmptyResult.to_body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "API response error: no image was generated." })
        );
    }
}
