use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vod_client::{config, is_development, proxy, router::PathRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up VOD_BACKEND_ORIGIN, VOD_PROXY_PORT, etc.
    let _ = dotenvy::dotenv();

    let default_level = if is_development!() { "vod_client=debug,tower_http=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = config::config();
    tracing::info!("Starting VOD dev proxy in {:?} mode", config.environment);

    let router = PathRouter::from_config()?;
    let state = proxy::ProxyState::from_config(Arc::new(router))?;

    let bind_addr = format!("{}:{}", config.proxy.host, config.proxy.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    println!("🚀 VOD dev proxy listening on http://{} -> {}", bind_addr, config.backend.origin);

    proxy::serve(listener, state, config.proxy.enable_cors).await?;
    Ok(())
}
