use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Structured error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "timestamp": "2025-06-09T10:30:00.000Z",
    "status": 404,
    "error": "Not Found",
    "message": "Order not found with id 550e8400-e29b-41d4-a716-446655440000",
    "path": "/api/v1/orders/550e8400-e29b-41d4-a716-446655440000"
}))]
pub struct ErrorResponse {
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
    /// Numeric HTTP status
    pub status: u16,
    /// HTTP status label (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Per-field validation messages, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    /// Request path that produced the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Validation failed")]
    ValidationFailed(Vec<String>),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();
        ServiceError::ValidationFailed(messages)
    }
}

impl ServiceError {
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BusinessRule(_)
            | Self::InsufficientStock(_)
            | Self::InvalidStatus(_)
            | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_) | Self::HashError(_) | Self::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Internal failures get a generic
    /// message; the detail is logged server-side instead.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(e) => {
                tracing::error!(error = %e, "database error surfaced to handler");
                "Internal server error".to_string()
            }
            Self::HashError(e) => {
                tracing::error!(error = %e, "hash error surfaced to handler");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::ValidationFailed(messages) => Some(messages.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details,
            path: crate::request_context::current_request_path(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("Customer not found".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ServiceError::Conflict("Email already registered".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn business_rule_and_stock_map_to_400() {
        assert_eq!(
            ServiceError::BusinessRule("terminal status".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InsufficientStock("requested 5, available 2".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ServiceError::DatabaseError(sea_orm::DbErr::Custom("secret".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_message(), "Internal server error");
    }

    #[test]
    fn validation_errors_collect_field_messages() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 3, message = "too short"))]
            name: String,
        }

        let probe = Probe {
            name: "ab".to_string(),
        };
        let err: ServiceError = probe.validate().unwrap_err().into();
        match err {
            ServiceError::ValidationFailed(messages) => {
                assert_eq!(messages, vec!["name: too short".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
