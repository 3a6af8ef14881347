use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI interface for `dbconn`
#[derive(Parser)]
#[command(name = "dbconn")]
#[command(version = crate::VERSION)]
#[command(about = "dbconn - Managed MySQL connections from environment configuration")]
#[command(
    long_about = "Resolve DB_HOST, DB_PORT, DB_USER, DB_PASSWORD and DB_NAME, \
                  open a MySQL connection and report whether it is usable"
)]
pub struct Cli {
    /// Load KEY=value pairs from this file into the environment first
    /// (defaults to ./.env if present)
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Open a connection and verify it is alive
    Check {
        /// Settings file with [pool] and [health] tables (defaults to ./dbconn.toml if present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Check out the connection from a pool instead of opening it directly
        #[arg(long)]
        pool: bool,
        /// Give up on the handshake after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Show the resolved connection configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one health check over a connection pool
    Health {
        /// Settings file with [pool] and [health] tables (defaults to ./dbconn.toml if present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
