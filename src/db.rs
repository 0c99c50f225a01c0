use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::StoreCredentials;

#[tracing::instrument(name = "Initialize database", skip(credentials))]
pub async fn init_db(credentials: &StoreCredentials) -> anyhow::Result<PgPool> {
    let options = PgConnectOptions::from_str(credentials.url.trim())
        .context("CATALOG_DATABASE_URL is not a valid postgres URL")?
        .password(credentials.key.expose_secret());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .context("Failed to connect to the catalog database")?;
    tracing::info!("Connected to the catalog database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::debug!("Migrations applied");

    Ok(pool)
}
