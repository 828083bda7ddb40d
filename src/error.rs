//! Application error taxonomy and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::services::storage::StorageError;

/// Errors surfaced by the gate, the store and the admin API
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid username/password")]
    InvalidCredentials,

    #[error("Server license expired")]
    LicenseExpired,

    #[error("Account expired")]
    AccountExpired,

    #[error("Account {0} already exists")]
    AccountExists(String),

    #[error("Account {0} not found")]
    AccountNotFound(String),

    #[error("Admin {0} already exists")]
    AdminExists(String),

    #[error("Admin {0} not found")]
    AdminNotFound(String),

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Global account limit reached")]
    GlobalLimitReached,

    #[error("Admin authentication required")]
    Unauthorized,

    #[error("Master admin required")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Machine-readable reason sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::LicenseExpired => "license_expired",
            AppError::AccountExpired => "account_expired",
            AppError::AccountExists(_) => "account_exists",
            AppError::AccountNotFound(_) => "account_not_found",
            AppError::AdminExists(_) => "admin_exists",
            AppError::AdminNotFound(_) => "admin_not_found",
            AppError::InsufficientCredits => "insufficient_credits",
            AppError::GlobalLimitReached => "global_limit_reached",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "invalid_request",
            AppError::Storage(_) => "storage_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::LicenseExpired
            | AppError::AccountExpired
            | AppError::InsufficientCredits
            | AppError::GlobalLimitReached
            | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::AccountNotFound(_) | AppError::AdminNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccountExists(_) | AppError::AdminExists(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; storage details stay in the logs
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Storage unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Storage(ref e) = self {
            tracing::error!("Storage failure: {}", e);
        }

        let body = serde_json::json!({
            "error": self.public_message(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
