//! Pieces shared by every router: the response envelope, auth cookie
//! handling, request tracing hooks and the admin gate.

pub mod cookies;
pub mod middleware;
pub mod tracing;

use serde::Serialize;

/// Envelope for successful JSON responses. Errors are rendered by
/// [`crate::errors::AppError`] instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}
