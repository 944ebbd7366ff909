//! Command-line interface for mancala_server.

use clap::{Parser, Subcommand};

/// Mancala turn server - asynchronous Kalah for humans and bots
#[derive(Parser, Debug)]
#[command(name = "mancala_server")]
#[command(about = "Asynchronous Kalah turn server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP turn server
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path (overrides the config file)
        #[arg(long)]
        database: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}
