use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meterguard_core::error::MeterguardError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into(), details: None }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, message: message.into(), details: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<MeterguardError> for ApiError {
    fn from(err: MeterguardError) -> Self {
        match &err {
            MeterguardError::InvalidInput { .. } => {
                Self::bad_request("Invalid input").with_details(err.to_string())
            }
            e if e.is_provider_failure() => {
                Self::bad_gateway("Geocoding provider unavailable").with_details(err.to_string())
            }
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid =
            MeterguardError::InvalidInput { field: "address".into(), reason: "empty".into() };
        assert_eq!(ApiError::from(invalid).status, StatusCode::BAD_REQUEST);

        let outage = MeterguardError::AllProvidersFailed { failures: "nominatim: 503".into() };
        assert_eq!(ApiError::from(outage).status, StatusCode::BAD_GATEWAY);

        let history = MeterguardError::History { reason: "poisoned".into() };
        let err = ApiError::from(history);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details.unwrap().contains("poisoned"));
    }
}
