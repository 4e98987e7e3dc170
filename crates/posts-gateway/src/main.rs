use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use posts_core::config::PostsConfig;
use posts_gateway::{app, cleanup::CleanupJob};
use posts_relay::RelayEngine;
use posts_store::StoreClient;
use tracing::info;

/// HTTP gateway for the posts service.
#[derive(Debug, Parser)]
#[command(name = "posts-gateway", version)]
struct Cli {
    /// Config file (default: $POSTS_CONFIG or ./posts.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posts_gateway=info,posts_store=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = PostsConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        PostsConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    info!(backend = %config.database.backend, url = %config.database.url, "opening record store");
    let store = StoreClient::from_config(&config)?;

    let state = Arc::new(app::AppState::new(config, store));
    if state.config.database.migrate_on_start {
        state.store.migrate(&state.execution_context()).await?;
    }
    let router = app::build_router(Arc::clone(&state));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // in-process trigger relay
    if state.config.relay.enabled {
        let engine = RelayEngine::from_config(&state.config.relay)?;
        let rx = shutdown_rx.clone();
        tokio::spawn(async move { engine.run(rx).await });
    }

    if let Some(job) = CleanupJob::from_config(&state.config.cleanup)? {
        let rx = shutdown_rx.clone();
        let job_state = Arc::clone(&state);
        tokio::spawn(async move { job.run(job_state, rx).await });
    }

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("posts gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    // stop timers, then let in-flight background work finish
    let _ = shutdown_tx.send(true);
    state.lifecycle.drain().await;
    Ok(())
}
