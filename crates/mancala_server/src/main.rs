//! Mancala turn server - unified CLI.

#![warn(missing_docs)]

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use mancala_server::{AppState, MemoryStore, ServerConfig, SqliteStore, Store, router};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            database,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(database) = database {
                config = config.with_database(database);
            }
            run_http_server(config).await
        }
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    Ok(config.with_env_secret())
}

/// Run the HTTP turn server
#[instrument(skip_all, fields(host = %config.host(), port = config.port()))]
async fn run_http_server(config: ServerConfig) -> Result<()> {
    let store: Arc<dyn Store> = match config.database() {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => {
            info!("No database configured, state is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    if config.shared_secret().is_some() {
        info!("Shared secret required on API routes");
    }

    let app = router(AppState::new(&config, store));

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app).await?;

    Ok(())
}
