pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod startup;
pub mod system;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::tracing::{
    make_custom_span, on_custom_failure, on_custom_request, on_custom_response,
};
use crate::auth::AuthService;
use crate::catalog::live::{CatalogWatch, LiveCatalog};
use crate::catalog::resolver::MetadataResolver;
use crate::config::Settings;

#[derive(Clone)]
pub struct InnerState {
    pub catalog: LiveCatalog,
    pub resolver: MetadataResolver,
    pub auth: AuthService,
    pub settings: Arc<Settings>,
    pub(crate) _watch: Option<Arc<CatalogWatch>>,
}

/// All routes except `/metrics`, which needs the process-wide recorder.
pub fn create_router(state: InnerState) -> Router {
    Router::new()
        .merge(system::create_system_router())
        .merge(api::create_api_router(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_custom_span)
                .on_request(on_custom_request)
                .on_response(on_custom_response)
                .on_failure(on_custom_failure),
        )
        .with_state(state)
}
