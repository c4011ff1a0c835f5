use anyhow::Context;
use hub_api::client::HubApi;
use hub_server::backend::HubBackend;
use hub_server::config::ServerConfig;
use hub_server::{AppState, app};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .compact()
        .init();

    let config = ServerConfig::from_env();
    if config.service_token.is_none() {
        tracing::warn!("HUB_SERVICE_TOKEN is not set; writes will use each caller's own token");
    }
    tracing::info!(project = %config.backend.project_id, "using backend {}", config.backend.firestore_url);

    let backend = HubBackend::new(HubApi::new(config.backend.clone()), config.service_token.clone());
    let router = app(AppState::new(backend));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("could not bind {}", config.bind))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            tracing::info!("received Ctrl+C, shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
