use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::api::common::cookies::{clear_auth_cookie, setup_auth_cookie};
use crate::api::common::middleware::extract_token;
use crate::api::common::ApiResponse;
use crate::auth::{Credentials, SignedIn};
use crate::errors::AppError;
use crate::InnerState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_admin: bool,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<SignedIn> for Session {
    fn from(signed_in: SignedIn) -> Self {
        Session {
            is_admin: true,
            email: Some(signed_in.email),
            token: Some(signed_in.token),
        }
    }
}

#[tracing::instrument(name = "Sign in", skip(inner, cookies, credentials), fields(email = %credentials.email))]
pub async fn sign_in(
    State(inner): State<InnerState>,
    cookies: Cookies,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    let signed_in = inner.auth.sign_in(&credentials).await?;
    setup_auth_cookie(&signed_in.token, &cookies);

    Ok(Json(ApiResponse::success(signed_in.into())))
}

#[tracing::instrument(name = "Sign up", skip(inner, cookies, credentials), fields(email = %credentials.email))]
pub async fn sign_up(
    State(inner): State<InnerState>,
    cookies: Cookies,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    if credentials.email.trim().is_empty() || credentials.password.len() < 8 {
        return Err(AppError::Validation(
            "email is required and the password needs at least 8 characters".to_string(),
        ));
    }

    let signed_in = inner.auth.sign_up(&credentials).await?;
    setup_auth_cookie(&signed_in.token, &cookies);

    Ok(Json(ApiResponse::success(signed_in.into())))
}

#[tracing::instrument(name = "Sign out", skip(cookies))]
pub async fn sign_out(cookies: Cookies) -> Json<ApiResponse<Session>> {
    clear_auth_cookie(&cookies);
    tracing::info!("Signed out");

    Json(ApiResponse::success(Session {
        is_admin: false,
        email: None,
        token: None,
    }))
}

/// The `isAdmin` check. Never fails; a missing or bad token is just not
/// an admin.
pub async fn me(State(inner): State<InnerState>, headers: HeaderMap) -> Json<ApiResponse<Session>> {
    let token = extract_token(&headers);
    let claims = inner.auth.admin_claims(token.as_deref());

    Json(ApiResponse::success(Session {
        is_admin: claims.is_some(),
        email: claims.map(|c| c.sub),
        token: None,
    }))
}
