use std::sync::Arc;

use indexer_core::api::{AppConfig, CliError, Registry, RunContext};
use indexer_plugins::factory;
use tokio_util::sync::CancellationToken;

use super::cli::ServeArgs;
use crate::http::{server, AppState};

/// Probe the configured stores in the background and serve the HTTP surface
/// until a shutdown signal arrives.
pub async fn handle_serve(args: ServeArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    if let Some(host) = args.host {
        cfg.http.host = host;
    }
    if let Some(port) = args.port {
        cfg.http.port = port;
    }

    let registry = Registry::new();
    let monitor = Arc::new(factory::build_monitor(&cfg, &registry)?);
    tracing::info!(stores = monitor.len(), "health monitor ready");

    let shutdown = CancellationToken::new();
    let ctx = RunContext::new().with_token(shutdown.clone());

    let checks = {
        let monitor = monitor.clone();
        let ctx = ctx.clone();
        let every = cfg.health.interval();
        tokio::spawn(async move { monitor.run_checks(&ctx, every).await })
    };

    let state = AppState::new(monitor, registry, ctx);
    let served = server::start_server(&cfg.http, state, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = checks.await {
        tracing::warn!(error = %e, "health check task ended abnormally");
    }
    served.map(|()| 0)
}
