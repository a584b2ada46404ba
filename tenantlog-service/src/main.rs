use std::net::SocketAddr;

use anyhow::Context;
use tenantlog_core::logging;
use tenantlog_service::config::ServiceConfig;
use tenantlog_service::{api, build_service};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("failed to load service configuration")?;

    if let Err(err) = logging::init_tracing(None, config.core.log_format) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let service = build_service(&config)
        .await
        .context("failed to initialise storage")?;

    let addr: SocketAddr = config
        .core
        .http_bind
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(
        %actual_addr,
        node = %config.core.node_name,
        workers = config.pool.workers,
        queue_capacity = config.pool.queue_capacity,
        "starting tenantlog-service"
    );

    if let Err(err) = axum::serve(listener, api::router(service).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?err, "server terminated with error");
    }

    info!("tenantlog-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
