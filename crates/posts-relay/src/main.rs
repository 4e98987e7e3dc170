use clap::Parser;
use posts_core::config::PostsConfig;
use posts_relay::RelayEngine;
use tracing::info;

/// Timer-driven relay that POSTs trigger events to the gateway's /api/scheduled.
#[derive(Debug, Parser)]
#[command(name = "posts-relay", version)]
struct Cli {
    /// Config file (default: $POSTS_CONFIG or ./posts.toml).
    #[arg(long)]
    config: Option<String>,

    /// Override the cron expression from config.
    #[arg(long)]
    cron: Option<String>,

    /// Fire a single trigger event now and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posts_relay=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PostsConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        PostsConfig::default()
    });
    if let Some(cron) = cli.cron {
        config.relay.cron = cron;
    }

    let engine = RelayEngine::from_config(&config.relay)?;
    info!(target_url = %engine.target(), cron = %engine.schedule(), "relay configured");

    if cli.once {
        let event = engine.event_now();
        engine.handle(&event).await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    engine.run(shutdown_rx).await;
    Ok(())
}
