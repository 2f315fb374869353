use std::sync::Arc;

use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config;
use crate::proxy::{self, ProxyState};
use crate::router::PathRouter;

#[derive(Subcommand)]
pub enum ProxyCommands {
    #[command(about = "Serve the dev proxy in the foreground")]
    Serve {
        #[arg(long, help = "Listen host (defaults to VOD_PROXY_HOST)")]
        host: Option<String>,
        #[arg(long, help = "Listen port (defaults to VOD_PROXY_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Backend origin for the standard rules, e.g. http://127.0.0.1:8000")]
        backend: Option<String>,
    },
}

pub async fn handle(cmd: ProxyCommands, _output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProxyCommands::Serve { host, port, backend } => {
            let cfg = &config::config().proxy;
            let router = match backend {
                Some(origin) => PathRouter::standard(&origin)?,
                None => PathRouter::from_config()?,
            };

            let bind_addr = format!(
                "{}:{}",
                host.as_deref().unwrap_or(&cfg.host),
                port.unwrap_or(cfg.port)
            );
            let listener = tokio::net::TcpListener::bind(&bind_addr)
                .await
                .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

            let state = ProxyState::from_config(Arc::new(router))?;
            proxy::serve(listener, state, cfg.enable_cors).await?;
            Ok(())
        }
    }
}
