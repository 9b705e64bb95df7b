//! Serve command - runs the relying-party HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Args, FromArgMatches};
use tessera_oidc::{AuthFlow, StoreConfig};
use tessera_server::{Server, ServerConfig};
use tracing::{info, warn};

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "TESSERA_BIND", default_value = "127.0.0.1:8001")]
    pub bind: SocketAddr,

    /// Browser origins allowed to call the API (comma-separated)
    #[arg(
        long = "frontend-origins",
        env = "TESSERA_FRONTEND_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub frontend_origins: Vec<String>,

    /// Seconds a login may stay pending before its callback is refused
    #[arg(
        long,
        env = "TESSERA_PENDING_TTL_SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub pending_ttl_secs: u64,

    /// Seconds a completed session stays readable (0 = until evicted)
    #[arg(long, env = "TESSERA_SESSION_TTL_SECS", default_value_t = 3600)]
    pub session_ttl_secs: u64,

    /// Maximum in-flight logins
    #[arg(
        long,
        env = "TESSERA_MAX_PENDING",
        default_value_t = 10_000,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_pending: usize,

    /// Maximum retained completed sessions
    #[arg(
        long,
        env = "TESSERA_MAX_SESSIONS",
        default_value_t = 10_000,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_sessions: usize,

    /// Requests per minute allowed on /auth routes (0 = unlimited)
    #[arg(long, env = "TESSERA_RATE_LIMIT_RPM", default_value_t = 120)]
    pub rate_limit_rpm: u32,

    /// Seconds between sweeps of expired entries
    #[arg(
        long,
        env = "TESSERA_SWEEP_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,
}

impl ServeArgs {
    /// Server settings for a bare `tessera` invocation: env vars over defaults.
    pub fn from_env() -> Result<Self> {
        let matches =
            Self::augment_args(clap::Command::new("serve")).try_get_matches_from(["serve"])?;
        Ok(Self::from_arg_matches(&matches)?)
    }

    fn store_config(&self) -> StoreConfig {
        let session_ttl =
            (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs));

        StoreConfig::new()
            .with_pending_ttl(Duration::from_secs(self.pending_ttl_secs))
            .with_session_ttl(session_ttl)
            .with_max_pending(self.max_pending)
            .with_max_sessions(self.max_sessions)
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
    }

    fn server_config(&self) -> ServerConfig {
        let origins = self
            .frontend_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        ServerConfig::new()
            .with_bind_address(self.bind)
            .with_cors_origins(origins)
            .with_auth_rpm(self.rate_limit_rpm)
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    info!(
        provider = %ctx.oidc.provider_url,
        client_id = %ctx.oidc.client_id,
        confidential = ctx.oidc.is_confidential(),
        "Starting Tessera"
    );

    let flow = AuthFlow::connect(ctx.oidc.clone(), args.store_config())
        .await
        .context("Failed to initialize authorization flow")?;
    let flow = Arc::new(flow);

    let sweeper = flow.store().spawn_sweeper();

    let server = Server::with_shared_flow(flow, args.server_config());
    let result = server.run_with_shutdown(args.bind, shutdown_signal()).await;

    sweeper.abort();
    result.context("Server failed")?;
    Ok(())
}

/// Resolve on Ctrl-C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
