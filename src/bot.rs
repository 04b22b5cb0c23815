use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info};
use tokio::time::{interval, MissedTickBehavior};

use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use crate::api::StatsCollector;
use crate::discord::{ChannelReconciler, DiscordPlatform};
use crate::error::Result;
use crate::stats::{format_value, SPECS};

/// Drives the fetch, format and reconcile cycle on a fixed interval. One
/// instance per process; owns its own tick bookkeeping.
pub struct RefreshOrchestrator {
    collector: StatsCollector,
    reconciler: ChannelReconciler,
    refresh_interval: Duration,
    tick: u64,
    last_refresh: Option<DateTime<Utc>>,
}

impl RefreshOrchestrator {
    pub fn new(
        collector: StatsCollector,
        reconciler: ChannelReconciler,
        refresh_interval: Duration,
    ) -> Self {
        Self { collector, reconciler, refresh_interval, tick: 0, last_refresh: None }
    }

    /// Runs the refresh cycle forever. Call only after the platform has
    /// signalled ready. The first cycle fires immediately, then once per
    /// interval.
    pub async fn run(&mut self, platform: &DiscordPlatform) {
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.refresh_once(platform).await;
        }
    }

    /// One full tick: every guild, every statistic. A failing guild is
    /// logged and skipped; it never blocks the others or the next tick.
    pub async fn refresh_once(&mut self, platform: &DiscordPlatform) {
        self.tick += 1;
        let guilds = platform.guild_ids();
        info!("tick {}: refreshing {} guild(s)", self.tick, guilds.len());

        for guild_id in guilds {
            if let Err(e) = self.refresh_guild(platform, guild_id).await {
                error!("failed to refresh guild {guild_id}: {e}");
            }
        }

        let finished = Utc::now();
        info!("tick {} complete at {}", self.tick, finished.format("%Y-%m-%d %H:%M:%S UTC"));
        self.last_refresh = Some(finished);
    }

    async fn refresh_guild(
        &mut self,
        platform: &DiscordPlatform,
        guild_id: Id<GuildMarker>,
    ) -> Result<()> {
        info!("updating stats for guild {guild_id}");

        let member_count = match platform.member_count(guild_id).await {
            Ok(count) => count,
            Err(e) => {
                error!("failed to fetch member count for {guild_id}: {e}");
                None
            }
        };

        let stats = self.collector.fetch_all(member_count).await;
        let category_id = self.reconciler.ensure_category(guild_id).await?;

        for spec in &SPECS {
            let formatted = format_value(spec, stats.get(spec.key));
            info!("{} {}", spec.label, formatted);
            if let Err(e) = self.reconciler.reconcile(guild_id, category_id, spec, &formatted).await
            {
                error!("failed to update channel '{}': {e}", spec.label);
            }
        }

        self.reconciler.lock_category(guild_id, category_id).await?;
        Ok(())
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }
}
