//! Response types for the QIP Incentive Engine API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API, plus the body of the `/conditions` endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::calculation::ConditionDefinition;
use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        if error.is_config_error() {
            return ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    error.to_string(),
                ),
            };
        }

        let details = match &error {
            EngineError::InvalidEmployee { .. } => "The employee data contains invalid information",
            EngineError::InvalidReportPeriod { .. } => "report_month must be formatted as YYYY-MM",
            EngineError::UnknownPositionType { .. } => "employee_type must be TYPE-1, TYPE-2 or TYPE-3",
            _ => "The request could not be evaluated",
        };

        ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::with_details(error.code(), error.to_string(), details),
        }
    }
}

/// Body of the `/conditions` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogueResponse {
    /// Version of the loaded rule configuration.
    pub config_version: String,
    /// Every condition in id order.
    pub conditions: &'static [ConditionDefinition],
}
