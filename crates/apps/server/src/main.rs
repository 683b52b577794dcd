use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voicechat_server::{
    config::{interval_from_secs, ServerConfig},
    metrics::start_metrics_reporter,
    ClientHub, PlayerStateManager, ServerMetrics, VoiceServer,
};

#[derive(Parser, Debug)]
#[command(name = "voicechat-server")]
#[command(about = "Voice chat presence server", long_about = None)]
struct Args {
    /// Address to bind, overrides VOICECHAT_BIND
    #[arg(long)]
    bind: Option<String>,

    /// Seconds between metrics log lines (0 disables), overrides VOICECHAT_METRICS_INTERVAL_SECS
    #[arg(long)]
    metrics_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(secs) = args.metrics_interval {
        config.metrics_interval = interval_from_secs(secs);
    }

    tracing::info!("Voice chat server v{}", env!("CARGO_PKG_VERSION"));

    let metrics = Arc::new(ServerMetrics::default());
    let hub = Arc::new(ClientHub::new(metrics.clone()));
    let manager = PlayerStateManager::new(hub.clone(), hub.clone());

    if let Some(period) = config.metrics_interval {
        tokio::spawn(start_metrics_reporter(metrics, period));
    }

    let server = VoiceServer::bind(&config, hub, manager)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    server.run().await?;

    Ok(())
}
