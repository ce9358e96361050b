//! HTTP request handlers for the QIP Incentive Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{CONDITION_CATALOGUE, evaluate_entries};
use crate::models::ReportConfig;

use super::request::EvaluationRequest;
use super::response::{ApiError, ApiErrorResponse, CatalogueResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_handler))
        .route("/conditions", get(conditions_handler))
        .with_state(state)
}

fn error_response(api_error: ApiErrorResponse) -> Response {
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}

/// Handler for POST /evaluate endpoint.
///
/// Evaluates a batch of employee records for one month and returns the
/// batch report. Individual bad records, including ones that fail to decode,
/// are reported inside the report; only request-level and configuration
/// problems produce an error status.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing evaluation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return error_response(ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error,
            });
        }
    };

    let loader = state.config();
    let report = match ReportConfig::parse(&request.report_month, loader.metadata().version.clone()) {
        Ok(report) => report,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                report_month = %request.report_month,
                "Invalid report month"
            );
            return error_response(err.into());
        }
    };

    let entries = request.into_entries();

    match evaluate_entries(&entries, loader.config(), &report) {
        Ok(batch) => {
            info!(
                correlation_id = %correlation_id,
                calculation_id = %batch.calculation_id,
                records = batch.summary.records,
                failed = batch.summary.failed,
                total_amount = %batch.summary.total_amount,
                duration_us = batch.duration_us,
                "Evaluation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(batch),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Evaluation failed"
            );
            error_response(err.into())
        }
    }
}

/// Handler for GET /conditions endpoint.
async fn conditions_handler(State(state): State<AppState>) -> Json<CatalogueResponse> {
    Json(CatalogueResponse {
        config_version: state.config().metadata().version.clone(),
        conditions: &CONDITION_CATALOGUE,
    })
}
