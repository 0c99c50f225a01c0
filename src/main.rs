use anyhow::Context;
use axum_prometheus::PrometheusMetricLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api_directory::config::Settings;
use api_directory::startup::build_state;
use api_directory::{create_router, system};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_directory=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let bind = settings.bind;
    tracing::info!("Catalog store mode: {:?}", settings.store_mode());

    let state = build_state(settings).await?;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = create_router(state)
        .merge(system::metrics_router(metric_handle))
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Could not bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
