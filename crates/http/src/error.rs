//! Error handling for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

const NOT_FOUND_TITLE: &str = "Object Not Found Exception. Check documentation";
const VALIDATION_TITLE: &str = "Bad Request Exception. Invalid fields.";
const BAD_REQUEST_TITLE: &str = "Bad Request Exception. Check documentation";
const METHOD_NOT_ALLOWED_TITLE: &str = "Method not allowed. Check documentation";
const TIMEOUT_TITLE: &str = "Request Timeout Exception. Try again later";
const TIMEOUT_MESSAGE: &str = "Request took too long to complete";
const INTERNAL_MESSAGE: &str = "Internal error in server";
const BLANK_FIELD_MESSAGE: &str = "must not be blank";

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub title: String,
    pub status: u16,
    pub error_message: String,
    pub developer_message: String,
    pub date_time: String,
}

/// One entry of a validation error response, naming the offending field
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorBody {
    #[serde(flatten)]
    pub error: ErrorBody,
    pub field: String,
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Violation for a required field that was missing or blank
    pub fn blank(field: impl Into<String>) -> Self {
        Self::new(field, BLANK_FIELD_MESSAGE)
    }
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error on {} field(s)", .violations.len())]
    Validation { violations: Vec<FieldViolation> },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a method not allowed error
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, reported as `developerMessage`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict { .. } => "conflict",
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            AppError::MethodNotAllowed { .. } => "method_not_allowed",
            AppError::Timeout => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Current time as `dd-MM-yyyy HH:mm:ss` (UTC)
pub fn format_date_time(at: OffsetDateTime) -> String {
    let format = format_description!("[day]-[month]-[year] [hour]:[minute]:[second]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let date_time = format_date_time(OffsetDateTime::now_utc());
        let status = self.status();
        let code = self.code();

        match &self {
            AppError::Internal(err) => tracing::error!(
                error_id = %error_id,
                error_code = %code,
                status_code = %status.as_u16(),
                error = ?err,
                "Request error"
            ),
            other => tracing::warn!(
                error_id = %error_id,
                error_code = %code,
                status_code = %status.as_u16(),
                error = %other,
                "Request error"
            ),
        }

        let body = |title: &str, message: &str| ErrorBody {
            title: title.to_string(),
            status: status.as_u16(),
            error_message: message.to_string(),
            developer_message: code.to_string(),
            date_time: date_time.clone(),
        };

        let error_response = match &self {
            AppError::Validation { violations } => {
                let entries: Vec<ValidationErrorBody> = violations
                    .iter()
                    .map(|violation| ValidationErrorBody {
                        error: body(VALIDATION_TITLE, violation.message.as_str()),
                        field: violation.field.clone(),
                    })
                    .collect();
                return (status, Json(entries)).into_response();
            }
            AppError::Conflict { message } => body(message.as_str(), message.as_str()),
            AppError::NotFound { message } => body(NOT_FOUND_TITLE, message.as_str()),
            AppError::BadRequest { message } => body(BAD_REQUEST_TITLE, message.as_str()),
            AppError::MethodNotAllowed { method } => body(
                METHOD_NOT_ALLOWED_TITLE,
                format!("Request method '{}' not supported", method).as_str(),
            ),
            AppError::Timeout => body(TIMEOUT_TITLE, TIMEOUT_MESSAGE),
            // Internal details stay in the logs.
            AppError::Internal(_) => body(INTERNAL_MESSAGE, INTERNAL_MESSAGE),
        };

        (status, Json(error_response)).into_response()
    }
}
