//! Conversion of [`AppError`] into HTTP responses.
//!
//! Provides the single place where error variants map to status codes and
//! the structured error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Status code mapping:
    /// - NotFound → 404
    /// - Duplicate → 409
    /// - Validation / ValidationErrors / BadRequest → 400
    /// - InvalidTransition / AlreadyTerminal → 400
    /// - Database / Configuration / Internal → 500
    /// - ConnectionPool → 503
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::not_found_error(entity, field, value),
            ),
            AppError::Duplicate {
                entity,
                field,
                value,
            } => (
                StatusCode::CONFLICT,
                ErrorResponse::duplicate_error(entity, field, value),
            ),
            AppError::Validation { field, reason } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(field, reason),
            ),
            AppError::ValidationErrors { errors } => {
                let details = json!({
                    "errors": errors.iter().map(|e| json!({
                        "field": e.field,
                        "message": e.message
                    })).collect::<Vec<_>>()
                });

                let message = if errors.len() == 1 {
                    format!(
                        "Validation failed for {}: {}",
                        errors[0].field, errors[0].message
                    )
                } else {
                    format!("Validation failed for {} field(s)", errors.len())
                };

                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("VALIDATION_ERRORS", &message).with_details(details),
                )
            }
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            AppError::InvalidTransition(transition) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("FORBIDDEN_TRANSITION", &transition.to_string()),
            ),
            AppError::AlreadyTerminal { state } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "ALREADY_TERMINAL",
                    &format!("Job is already terminal in state {state}"),
                )
                .with_details(json!({ "state": state })),
            ),
            AppError::Database { operation, source } => {
                tracing::error!(
                    error = ?source,
                    operation = %operation,
                    "Database error occurred"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "DATABASE_ERROR",
                        &format!("Database operation failed: {operation}"),
                    ),
                )
            }
            AppError::Configuration { key, source } => {
                tracing::error!(error = ?source, key = %key, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("CONFIGURATION_ERROR", &format!("Configuration error: {key}")),
                )
            }
            AppError::ConnectionPool { source } => {
                tracing::error!(error = ?source, "Connection pool error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("SERVICE_UNAVAILABLE", "Database is unavailable"),
                )
            }
            AppError::Internal { source } => {
                tracing::error!(error = ?source, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::state::{validate_transition, JobState};

    #[test]
    fn not_found_is_404() {
        let response = AppError::job_not_found("01J000").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_transition_is_400() {
        let err: AppError = validate_transition(JobState::Pending, JobState::Running)
            .unwrap_err()
            .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn already_terminal_is_400() {
        let response = AppError::AlreadyTerminal {
            state: "FAILED".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
