use cookie::SameSite;
use time::{Duration, OffsetDateTime};
use tower_cookies::{Cookie, Cookies};

use crate::auth::{AUTH_COOKIE, TOKEN_LIFETIME_DAYS};

pub fn setup_auth_cookie(token: &str, cookies: &Cookies) {
    let mut cookie = Cookie::new(AUTH_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_expires(OffsetDateTime::now_utc() + Duration::days(TOKEN_LIFETIME_DAYS));

    cookies.add(cookie);
    tracing::debug!("Auth cookie set");
}

pub fn clear_auth_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookies.add(cookie);
}
