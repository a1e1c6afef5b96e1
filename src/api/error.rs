//! API error responses
//!
//! Every failure leaves the API as
//! `{"error": {"code": "...", "message": "...", "details": ...}}`
//! with the HTTP status derived from the code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::ServiceError;

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "INVALID_REFERENCE" | "CIRCULAR_REFERENCE" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(v) => Self::with_details(
                "VALIDATION_ERROR",
                message,
                json!({ "field": v.field, "message": v.message }),
            ),
            ServiceError::Duplicate { field, value, .. } => Self::with_details(
                "CONFLICT",
                message,
                json!({ "field": field, "value": value }),
            ),
            ServiceError::HasDependents { .. } => Self::new("CONFLICT", message),
            ServiceError::InvalidReference { field, id } => Self::with_details(
                "INVALID_REFERENCE",
                message,
                json!({ "field": field, "id": id }),
            ),
            ServiceError::CircularReference { .. } => Self::new("CIRCULAR_REFERENCE", message),
            ServiceError::NotFound { .. } => Self::not_found(message),
            ServiceError::Authentication(_) => Self::new("UNAUTHORIZED", message),
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::from(ValidationError::new("title", "required")), StatusCode::BAD_REQUEST),
            (ServiceError::duplicate("Tag", "slug", "rust"), StatusCode::CONFLICT),
            (
                ServiceError::HasDependents {
                    entity: "Category",
                    id: 1,
                    reason: "children".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::InvalidReference { field: "tag_ids", id: 2 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::CircularReference { entity: "Page", id: 3 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ServiceError::not_found("Post", 4), StatusCode::NOT_FOUND),
            (ServiceError::Authentication("nope".to_string()), StatusCode::UNAUTHORIZED),
            (
                ServiceError::Internal(anyhow::anyhow!("disk on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let api = ApiError::from(ServiceError::Internal(anyhow::anyhow!("secret path /var/db")));
        assert_eq!(api.error.code, "INTERNAL_ERROR");
        assert!(!api.error.message.contains("/var/db"));
    }

    #[test]
    fn test_validation_details() {
        let api = ApiError::from(ServiceError::from(ValidationError::new("slug", "bad")));
        let body = serde_json::to_value(&api).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "slug");
    }
}
