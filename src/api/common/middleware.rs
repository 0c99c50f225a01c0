use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use crate::auth::AUTH_COOKIE;
use crate::errors::AppError;
use crate::InnerState;

/// Lets the request through only with a valid admin token, and exposes the
/// decoded claims as a request extension.
pub async fn admin_middleware(
    State(inner): State<InnerState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::warn!("Admin route called without a token: {}", request.uri().path());
        AppError::Authentication("sign in as an admin first".to_string())
    })?;

    let claims = inner.auth.verify_token(&token)?;
    tracing::debug!("Admin request from {}", claims.sub);

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Reads the token from `Authorization: Bearer` or the auth cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_header_wins() {
        let req = headers(header::AUTHORIZATION, "Bearer abc.def");
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let req = headers(header::COOKIE, "theme=dark; auth-token=xyz; lang=en");
        assert_eq!(extract_token(&req).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_token_is_none() {
        let req = headers(header::COOKIE, "theme=dark");
        assert_eq!(extract_token(&req), None);
        let basic = headers(header::AUTHORIZATION, "Basic Zm9vOmJhcg==");
        assert_eq!(extract_token(&basic), None);
    }
}
