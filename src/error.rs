use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::models::UsageType;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<QuotaUsageDetail>,
}

/// Usage figures attached to a quota rejection
#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsageDetail {
    pub usage_type: UsageType,
    pub current_count: i32,
    pub limit: Option<i32>,
    pub remaining: i32,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Quota exceeded for {usage_type}: {current_count} used, {remaining} remaining")]
    QuotaExceeded {
        usage_type: UsageType,
        current_count: i32,
        limit: Option<i32>,
        remaining: i32,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_type = match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::Configuration(_) => "ConfigurationError",
            AppError::QuotaExceeded { .. } => "QuotaExceeded",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        };

        let usage = match self {
            AppError::QuotaExceeded {
                usage_type,
                current_count,
                limit,
                remaining,
            } => Some(QuotaUsageDetail {
                usage_type: *usage_type,
                current_count: *current_count,
                limit: *limit,
                remaining: *remaining,
            }),
            _ => None,
        };

        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: error_type.to_string(),
                message: self.to_string(),
                usage,
            },
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
