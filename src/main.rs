use anyhow::{Context, Result};
use dbconn::cli::{Cli, Commands};
use dbconn::commands::{check, health, show_config};
use std::process;
use tracing_subscriber::EnvFilter;

// Allow println in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() {
    init_logging();

    let cli = Cli::parse();
    tracing::debug!("dbconn CLI initialized");

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::disallowed_methods)]
fn run(cli: Cli) -> Result<()> {
    load_env_file(cli.env_file.as_deref())?;

    match cli.command {
        Some(Commands::Check {
            config,
            pool,
            timeout,
        }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check::handle_check(config.as_deref(), pool, timeout))
        }
        Some(Commands::Config { json }) => show_config::handle_show_config(json),
        Some(Commands::Health { config }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(health::handle_health(config.as_deref()))
        }
        None => {
            println!("dbconn - Use --help for available commands");
            Ok(())
        }
    }
}

/// Populate the environment from a `.env` file before configuration is resolved
fn load_env_file(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        None => {
            // a missing ./.env is normal
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Default to INFO level, can be overridden by RUST_LOG environment variable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbconn=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
