use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use dresscode_api::app::{self, services::AppServices};
use dresscode_infra::{AppConfig, InMemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("config").context("failed to load configuration")?;
    dresscode_observability::init(&config.telemetry.log_level);

    let store: Arc<dyn Store> = if config.database.use_persistent {
        let url = config
            .database
            .url
            .as_ref()
            .context("database.url is not set")?;
        let store = PgStore::connect(url.expose_secret(), config.database.max_connections)
            .await
            .context("failed to connect to postgres")?;
        tracing::info!("using postgres store");
        Arc::new(store)
    } else {
        tracing::warn!("database.use_persistent is off; data lives in process memory");
        Arc::new(InMemoryStore::new())
    };

    let services = Arc::new(AppServices::new(store, &config.jwt));

    if let Some(admin) = &config.admin {
        services
            .bootstrap_admin(admin)
            .await
            .context("failed to bootstrap admin account")?;
    }

    let app = app::build_app(services);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
