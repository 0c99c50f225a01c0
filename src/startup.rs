use std::sync::Arc;

use crate::auth::AuthService;
use crate::catalog::live::LiveCatalog;
use crate::catalog::resolver::MetadataResolver;
use crate::catalog::store::{CatalogStore, FallbackStore, RemoteStore};
use crate::config::Settings;
use crate::db::init_db;
use crate::InnerState;

/// Chooses the store once, loads the catalog and starts the change feed.
#[tracing::instrument(name = "Build application state", skip(settings))]
pub async fn build_state(settings: Settings) -> anyhow::Result<InnerState> {
    let (store, auth): (Arc<dyn CatalogStore>, AuthService) = match settings.store_credentials() {
        Some(credentials) => {
            tracing::info!("Store credentials are well-formed, using the remote catalog");
            let db = init_db(credentials).await?;
            (
                Arc::new(RemoteStore::new(db.clone())),
                AuthService::with_database(db, settings.jwt_secret.clone()),
            )
        }
        None => {
            tracing::warn!("No usable store credentials, serving the demo catalog");
            (
                Arc::new(FallbackStore::seeded()),
                AuthService::demo(settings.demo_admin.clone(), settings.jwt_secret.clone()),
            )
        }
    };

    let catalog = LiveCatalog::load(store).await;
    let watch = match catalog.watch().await {
        Ok(watch) => Some(Arc::new(watch)),
        Err(e) => {
            tracing::error!("Could not subscribe to catalog changes: {}", e);
            None
        }
    };

    let resolver = MetadataResolver::new(settings.metadata_endpoint.clone());
    tracing::info!("Resolving metadata through {}", resolver.endpoint());

    Ok(InnerState {
        catalog,
        resolver,
        auth,
        settings: Arc::new(settings),
        _watch: watch,
    })
}
