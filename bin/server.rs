// Food Catalog - Web Server
// REST API over the category → subcategory → unit catalog

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use food_catalog::config::Config;
use food_catalog::http::{create_router, AppState};
use food_catalog::{db, logging};

#[derive(Parser, Debug)]
#[command(name = "food-server")]
#[command(version, about = "Food catalog HTTP server", long_about = None)]
struct Args {
    /// Config file; defaults to food-catalog.yaml in the working directory or $HOME.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path, overriding the config file.
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.database = database;
    }
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    logging::init(&config.logger)?;

    let conn = db::open(&config.database)?;
    tracing::info!(database = %config.database.display(), "database opened");

    let state = AppState::new(conn, config.request_timeout());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;

    tracing::info!(
        listen = %config.listen,
        timeout_secs = config.request_timeout_secs,
        "food catalog server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
