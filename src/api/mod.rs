//! HTTP surface of the directory.
//!
//! Browsing and auth routes are public. Everything under `/admin` goes
//! through [`common::middleware::admin_middleware`].

pub mod admin;
pub mod auth;
pub mod common;
pub mod videos;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_cookies::CookieManagerLayer;

use crate::api::common::middleware::admin_middleware;
use crate::InnerState;

#[tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating API router");

    let admin_routes = Router::new()
        .route("/admin/videos", post(admin::create_video))
        .route("/admin/videos/refresh", post(admin::refresh_catalog))
        .route(
            "/admin/videos/:id",
            put(admin::update_video).delete(admin::delete_video),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    Router::new()
        .route("/categories", get(videos::categories))
        .route("/videos", get(videos::list_videos))
        .route("/videos/:id", get(videos::get_video))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        .merge(admin_routes)
        .layer(CookieManagerLayer::new())
}
