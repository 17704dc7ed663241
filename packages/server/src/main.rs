use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};

use pin_proxy::backend::BackendClient;
use pin_proxy::config::{AppConfig, DatabaseConfig};
use pin_proxy::metrics::ProxyMetrics;
use pin_proxy::state::AppState;
use pin_proxy::store::{DbOwnershipStore, MemoryOwnershipStore, OwnershipStore};

#[derive(Parser, Debug)]
#[command(name = "pin-proxy", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the proxy.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Address to listen on, e.g. 127.0.0.1:8080.
    #[arg(long, env = "PIN_PROXY_ADDRESS")]
    address: Option<String>,

    /// Base URL of the storage node's HTTP API.
    #[arg(long, env = "PIN_PROXY_TARGET")]
    target: Option<String>,

    /// `postgres://...` or `memory`.
    #[arg(long, env = "PIN_PROXY_DATABASE_URL")]
    database_url: Option<String>,
}

impl RunArgs {
    fn apply(self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(address) = self.address {
            let addr: SocketAddr = address
                .parse()
                .with_context(|| format!("invalid --address '{address}'"))?;
            config.server.host = addr.ip().to_string();
            config.server.port = addr.port();
        }
        if let Some(target) = self.target {
            config.backend.url = target;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        Ok(())
    }
}

async fn open_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn OwnershipStore>> {
    if config.is_memory() {
        warn!("Using in-memory store; ownership records are lost on restart");
        return Ok(Arc::new(MemoryOwnershipStore::new()));
    }

    let db = pin_proxy::database::init_db(&config.url)
        .await
        .context("failed to connect to database")?;
    pin_proxy::database::ensure_indexes(&db).await?;
    Ok(Arc::new(DbOwnershipStore::new(db)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let Commands::Run(args) = Cli::parse().command;

    let mut config = AppConfig::load().context("failed to load configuration")?;
    args.apply(&mut config)?;

    let backend = BackendClient::new(&config.backend)?;
    let store = open_store(&config.database).await?;

    let addr = config.server.address();
    let state = AppState {
        store,
        backend,
        metrics: ProxyMetrics::new(),
    };

    info!(backend = %state.backend.base_url(), "Proxying storage node");

    let app = pin_proxy::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
