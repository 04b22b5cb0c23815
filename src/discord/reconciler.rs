use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{sleep_until, Instant};

use twilight_http::Client as HttpClient;
use twilight_model::channel::permission_overwrite::PermissionOverwriteType as ChannelOverwriteType;
use twilight_model::channel::{Channel, ChannelType};
use twilight_model::guild::Permissions;
use twilight_model::http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::id::marker::{ChannelMarker, GenericMarker, GuildMarker};
use twilight_model::id::Id;

use crate::error::Result;
use crate::stats::StatSpec;

/// Spaces out mutating calls against the Discord API. twilight's HTTP client
/// already queues on Discord's rate-limit buckets; this adds a configurable
/// floor between consecutive create/rename calls on top of that.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    /// Waits until `min_interval` has passed since the previous call. The
    /// first call never waits.
    pub async fn pace(&mut self) {
        if let Some(last) = self.last {
            sleep_until(last + self.min_interval).await;
        }
        self.last = Some(Instant::now());
    }
}

/// Case- and space-insensitive form used for prefix matching channel names
/// against stat labels.
pub fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Whether a live channel is the readout for the given label. The rename
/// appends the value after the label, so prefix matching keeps finding the
/// same channel on later cycles.
pub fn matches_label(channel_name: &str, label: &str) -> bool {
    normalize(channel_name).starts_with(&normalize(label))
}

fn is_stat_channel(channel: &Channel, category_id: Id<ChannelMarker>) -> bool {
    channel.kind == ChannelType::GuildVoice && channel.parent_id == Some(category_id)
}

fn connect_already_denied(channel: &Channel, everyone: Id<GenericMarker>) -> bool {
    channel
        .permission_overwrites
        .as_ref()
        .map(|overwrites| {
            overwrites.iter().any(|ow| {
                ow.kind == ChannelOverwriteType::Role
                    && ow.id == everyone
                    && ow.deny.contains(Permissions::CONNECT)
            })
        })
        .unwrap_or(false)
}

/// Converges the stats category of one guild onto the fetched values:
/// find-or-create a voice channel per statistic, rename it, and keep every
/// readout channel unjoinable.
pub struct ChannelReconciler {
    http: Arc<HttpClient>,
    category_name: String,
    pacer: Pacer,
}

impl ChannelReconciler {
    pub fn new(http: Arc<HttpClient>, category_name: String, pacing: Duration) -> Self {
        Self { http, category_name, pacer: Pacer::new(pacing) }
    }

    async fn guild_channels(&self, guild_id: Id<GuildMarker>) -> Result<Vec<Channel>> {
        Ok(self.http.guild_channels(guild_id).await?.models().await?)
    }

    /// Finds the stats category by exact name, creating it if absent.
    pub async fn ensure_category(&mut self, guild_id: Id<GuildMarker>) -> Result<Id<ChannelMarker>> {
        let channels = self.guild_channels(guild_id).await?;
        if let Some(category) = channels.iter().find(|c| {
            c.kind == ChannelType::GuildCategory
                && c.name.as_deref() == Some(self.category_name.as_str())
        }) {
            return Ok(category.id);
        }

        info!("creating category '{}'", self.category_name);
        self.pacer.pace().await;
        let created = self
            .http
            .create_guild_channel(guild_id, &self.category_name)
            .kind(ChannelType::GuildCategory)
            .await?
            .model()
            .await?;
        Ok(created.id)
    }

    /// Brings one statistic's channel in line with its freshly formatted
    /// value. At most one channel per stat exists afterwards; matching is by
    /// normalized label prefix.
    pub async fn reconcile(
        &mut self,
        guild_id: Id<GuildMarker>,
        category_id: Id<ChannelMarker>,
        spec: &StatSpec,
        formatted: &str,
    ) -> Result<()> {
        let channels = self.guild_channels(guild_id).await?;
        let target = format!("{} {}", spec.label, formatted);

        let existing = channels.iter().find(|c| {
            is_stat_channel(c, category_id)
                && matches_label(c.name.as_deref().unwrap_or(""), spec.label)
        });

        let channel_id = match existing {
            Some(channel) => {
                if channel.name.as_deref() == Some(target.as_str()) {
                    debug!("'{}' already current", target);
                    return Ok(());
                }
                channel.id
            }
            None => {
                info!("creating voice channel '{}'", spec.label);
                self.pacer.pace().await;
                let created = self
                    .http
                    .create_guild_channel(guild_id, spec.label)
                    .kind(ChannelType::GuildVoice)
                    .parent_id(category_id)
                    .await?
                    .model()
                    .await?;
                created.id
            }
        };

        self.pacer.pace().await;
        self.http.update_channel(channel_id).name(&target).await?;
        debug!("renamed channel to '{}'", target);
        Ok(())
    }

    /// Denies connect for the everyone role on every voice channel under the
    /// category, including channels this tick never touched. Channels already
    /// restricted are skipped, as is anything that is not a voice channel
    /// under the category. Per-channel failures are logged and do not stop
    /// the sweep.
    pub async fn lock_category(
        &mut self,
        guild_id: Id<GuildMarker>,
        category_id: Id<ChannelMarker>,
    ) -> Result<()> {
        let channels = self.guild_channels(guild_id).await?;
        let everyone: Id<GenericMarker> = guild_id.cast();

        for channel in &channels {
            if !is_stat_channel(channel, category_id) {
                continue;
            }
            if connect_already_denied(channel, everyone) {
                continue;
            }
            self.pacer.pace().await;
            let overwrite = PermissionOverwrite {
                allow: None,
                deny: Some(Permissions::CONNECT),
                id: everyone,
                kind: PermissionOverwriteType::Role,
            };
            if let Err(e) = self.http.update_channel_permission(channel.id, &overwrite).await {
                warn!("failed to restrict channel {}: {e}", channel.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case_and_spaces() {
        assert!(matches_label("Members: 9,000", "Members:"));
        assert!(matches_label("members:9,000", "Members:"));
        assert!(matches_label("MEMBERS: 12", "Members:"));
        assert!(!matches_label("Block: 12", "Members:"));
    }

    #[test]
    fn renamed_channel_still_matches_its_own_label() {
        // The invariant behind idempotence: once renamed, the channel keeps
        // matching on the next cycle, so it is renamed again, not duplicated.
        for spec in &crate::stats::SPECS {
            let renamed = format!("{} 12,345", spec.label);
            assert!(matches_label(&renamed, spec.label), "label {:?}", spec.label);
        }
    }

    #[test]
    fn freshly_created_channel_matches_its_label() {
        // A new channel is created with the bare label as its name.
        for spec in &crate::stats::SPECS {
            assert!(matches_label(spec.label, spec.label));
        }
    }

    #[test]
    fn labels_do_not_shadow_each_other() {
        // No label may be a normalized prefix of another, or two stats would
        // fight over one channel.
        for a in &crate::stats::SPECS {
            for b in &crate::stats::SPECS {
                if a.key != b.key {
                    assert!(
                        !matches_label(a.label, b.label),
                        "{:?} matches {:?}",
                        a.label,
                        b.label
                    );
                }
            }
        }
    }

    #[test]
    fn normalize_strips_spaces_and_lowercases() {
        assert_eq!(normalize("Hashrate (MeowPow): GH/s"), "hashrate(meowpow):gh/s");
    }

    #[test]
    fn pacer_first_call_is_immediate() {
        tokio_test::block_on(async {
            let mut pacer = Pacer::new(Duration::from_secs(60));
            pacer.pace().await;
        });
    }

    #[tokio::test(start_paused = true)]
    async fn pacer_spaces_out_consecutive_calls() {
        let mut pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();
        pacer.pace().await;
        pacer.pace().await;
        pacer.pace().await;
        assert!(Instant::now() - start >= Duration::from_millis(1000));
    }
}
