use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use notify_relay::config::RelayConfig;
use notify_relay::continuation::FileContinuationStore;
use notify_relay::delivery::{DeliveryPlatform, DiscordPlatform, LogPlatform};
use notify_relay::logging;
use notify_relay::relay::RelaySupervisor;

#[derive(Parser, Debug)]
#[command(name = "notify-relay")]
#[command(about = "Relays video and livestream notifications to chat recipients")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "NOTIFY_RELAY_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Log deliveries instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RelayConfig::load(Some(&args.config))
        .with_context(|| format!("loading {}", args.config.display()))?;

    logging::init_logging(&config.logging)?;

    let platform: Arc<dyn DeliveryPlatform> = if args.dry_run {
        tracing::warn!("Dry run: notifications are logged, not sent");
        Arc::new(LogPlatform::new())
    } else {
        let discord = config
            .discord_config()
            .context("a [discord] section is required unless --dry-run is given")?;
        Arc::new(DiscordPlatform::new(discord)?)
    };

    let store = FileContinuationStore::open(&config.continuation_dir)
        .await
        .with_context(|| format!("opening {}", config.continuation_dir.display()))?;

    let supervisor = RelaySupervisor::from_config(&config, Arc::new(store), platform)?;
    if supervisor.subscriptions().is_empty() {
        tracing::warn!("No notifications configured");
    }

    tracing::info!(
        endpoint = %config.endpoint,
        subscriptions = supervisor.subscriptions().len(),
        dry_run = args.dry_run,
        "Starting notify-relay"
    );

    supervisor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
