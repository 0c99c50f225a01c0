use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as StdError;

use crate::auth::AuthError;
use crate::catalog::ingest::IngestError;
use crate::catalog::store::StoreError;
use crate::catalog::InvalidUrl;

pub const DEMO_MODE_NOTICE: &str =
    "Demo mode: adding and editing videos needs a configured catalog database";

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(#[from] InvalidUrl),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidUrl(e) => AppError::InvalidUrl(e),
            IngestError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Authentication(err.to_string()),
            AuthError::NotConfigured => AppError::Store(StoreError::Capability),
            AuthError::Duplicate(email) => {
                AppError::Validation(format!("an admin with email {email} already exists"))
            }
            AuthError::Unexpected(e) => AppError::Unexpected(e),
        }
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "invalid_url"),
            AppError::Store(StoreError::Validation(_)) | AppError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
            AppError::Store(StoreError::Connection(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "connection_error")
            }
            AppError::Store(StoreError::Auth(_)) => (StatusCode::BAD_GATEWAY, "store_auth_error"),
            AppError::Store(StoreError::NotFound(_)) | AppError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::Store(StoreError::Capability) => (StatusCode::FORBIDDEN, "demo_mode"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Store(StoreError::Capability) => DEMO_MODE_NOTICE.to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error_code = code, status_code = %status, "Request error: {}", message);
        } else {
            tracing::warn!(error_code = code, status_code = %status, "Request rejected: {}", message);
        }

        if let AppError::Unexpected(e) = &self {
            let mut source_chain = String::new();
            let mut current_err: Option<&(dyn StdError + 'static)> = e.source();
            while let Some(err) = current_err {
                source_chain.push_str(&format!("\n  Caused by: {}", err));
                current_err = err.source();
            }
            if !source_chain.is_empty() {
                tracing::error!("Unexpected error source chain:{}", source_chain);
            }
        }

        let body = Json(json!({
            "message": message,
            "status": status.as_u16(),
            "code": code,
        }));
        (status, body).into_response()
    }
}
