use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use callrouter::config::AppConfig;
use callrouter::db::{self, SqliteStore, TenantStore};
use callrouter::handlers;
use callrouter::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let store: Arc<dyn TenantStore> = Arc::new(SqliteStore::new(conn));

    if config.default_business_id.is_none() {
        tracing::warn!("DEFAULT_BUSINESS_ID not set, calls to unknown numbers will be rejected");
    }
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set, webhook requests are not authenticated");
    }
    tracing::info!(
        routes = config.tenant_routes.len(),
        cache_ttl = ?config.context_cache_ttl,
        timeout = ?config.response_timeout,
        "tenant routing configured"
    );

    let state = Arc::new(AppState::new(store, config.clone()));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
