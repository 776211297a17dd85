//! Service binary: load config, open the store, wire the Stripe client, and
//! serve the router.

use anyhow::Context;
use clap::Parser;
use inkvert::api::{router, AppState};
use inkvert::payment::StripeClient;
use inkvert::store::PremiumStore;
use inkvert::{AppConfig, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "inkvert",
    version,
    about = "Invert PDF colours for dark-mode reading, over HTTP"
)]
struct Cli {
    /// Port to listen on (overrides INKVERT_PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Premium-token database file (overrides INKVERT_DATABASE_PATH).
    #[arg(long)]
    database_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(path) = cli.database_path {
        config.database_path = path;
    }

    let store = SqliteStore::connect(&config.database_path)
        .await
        .with_context(|| {
            format!(
                "opening premium-token store at {}",
                config.database_path.display()
            )
        })?;
    store.initialize().await.context("creating store schema")?;

    let payments = StripeClient::new(&config.stripe);
    if config.stripe.webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is unset; webhook deliveries will be rejected");
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState {
        config,
        store: Arc::new(store),
        payments: Arc::new(payments),
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
