use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shopforum_api::{config::AppConfig, state::AppState, store::RestStore};

#[derive(Parser)]
#[command(name = "shopforum-api")]
#[command(about = "Product catalogue and forum HTTP API")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Address to bind (overrides API_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL and SUPABASE_KEY
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    tracing::info!("Starting in {:?} mode against {}", config.environment, config.store.url);

    let store = RestStore::new(&config.store).context("failed to build store client")?;
    let bind_addr = format!("{}:{}", config.api.host, config.api.port);

    let state = AppState::new(Arc::new(store), config);
    let app = shopforum_api::app(state).context("invalid route table")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
