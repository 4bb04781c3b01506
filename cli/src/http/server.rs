use std::net::SocketAddr;

use axum::{middleware, Router};
use indexer_core::api::{CliError, HttpConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{
    middleware::{create_timeout_layer, request_logger},
    routes::create_router,
    AppState,
};

pub fn build_app(state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_timeout_layer())
}

/// Bind `cfg.host:cfg.port` and serve until Ctrl+C, SIGTERM or `shutdown`.
/// `shutdown` is cancelled on return.
pub async fn start_server(
    cfg: &HttpConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let addr: SocketAddr = cfg
        .bind_addr()
        .parse()
        .map_err(|e| CliError::Server(format!("invalid bind address {}: {e}", cfg.bind_addr())))?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);

    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let app = build_app(state);
    let token = shutdown.clone();

    let res = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!("received SIGTERM signal");
                }
                _ = token.cancelled() => {
                    info!("shutdown requested");
                }
            }
            info!("starting graceful shutdown");
        })
        .await;

    shutdown.cancel();
    res.map_err(|e| CliError::Server(e.to_string()))?;
    info!("server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
