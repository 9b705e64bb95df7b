//! Tessera - OpenID Connect relying party with PKCE
//!
//! Main entry point for the Tessera CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{ProviderArgs, endpoints, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tessera - OpenID Connect relying party with PKCE
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write JSON logs to daily-rotated files in this directory
    #[arg(long, global = true, env = "TESSERA_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relying-party HTTP server (default)
    Serve(serve::ServeArgs),

    /// Resolve and print the provider endpoints
    Endpoints(endpoints::EndpointsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Install the console layer and, when a log directory is given, a JSON file layer.
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
fn init_tracing(verbose: bool, log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "tessera=debug,tessera_oidc=debug,tessera_server=debug,tower_http=debug,info"
    } else {
        "tessera=info,tessera_oidc=info,tessera_server=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "tessera.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "tessera=trace,tessera_oidc=trace,tessera_server=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing(cli.verbose, cli.log_dir.as_ref());

    let ctx = commands::Context {
        oidc: cli.provider.to_config(),
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        None => serve::run(serve::ServeArgs::from_env()?, &ctx).await,
        Some(Commands::Serve(args)) => serve::run(args, &ctx).await,
        Some(Commands::Endpoints(args)) => endpoints::run(args, &ctx).await,
    }
}
