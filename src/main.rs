use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::time::Duration;

use mewc_stats_bot::api::StatsCollector;
use mewc_stats_bot::bot::RefreshOrchestrator;
use mewc_stats_bot::cli::Cli;
use mewc_stats_bot::config::{Config, TOKEN_ENV_VAR};
use mewc_stats_bot::discord::{ChannelReconciler, DiscordPlatform};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!("Starting Meowcoin stats bot...");

    let config_path = cli.config.unwrap_or_else(|| "config/config.toml".into());
    let config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("could not load {:?} ({e}), using defaults", config_path);
            Config::default()
        }
    };

    let token = config.resolve_token(std::env::var(TOKEN_ENV_VAR).ok())?;

    let collector = StatsCollector::new(&config.endpoints)?;
    info!("Stats collector initialized.");

    let mut platform = DiscordPlatform::connect(token).await?;
    platform.wait_until_ready().await;
    info!("The bot is ready");

    let reconciler = ChannelReconciler::new(
        platform.http(),
        config.discord.stats_category.clone(),
        Duration::from_millis(config.refresh.pacing_ms),
    );
    let mut orchestrator = RefreshOrchestrator::new(
        collector,
        reconciler,
        Duration::from_secs(config.refresh.interval_secs),
    );

    tokio::select! {
        _ = orchestrator.run(&platform) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    platform.shutdown().await;
    Ok(())
}
