use anyhow::Context;
use clap::Parser;
use ginku_reqwest::UpstreamClient;
use ginku_server::{AppState, Config, logging, router};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    logging::init(config.log_format)
        .map_err(anyhow::Error::msg)
        .context("failed to install tracing subscriber")?;

    let client = UpstreamClient::new(
        config.upstream_url.clone(),
        config.api_key.clone(),
        config.upstream_timeout,
    )
    .context("failed to build upstream client")?;
    let state = AppState::new(client, config.ttls());
    let app = router(state.clone());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        upstream = %state.client().base_url(),
        cache_ttl = %humantime::format_duration(config.cache_ttl),
        realtime_ttl = %humantime::format_duration(config.realtime_ttl),
        "ginku-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            state.shutdown();
        })
        .await
        .context("server error")?;

    info!("ginku-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
