use std::sync::Arc;
use std::time::Duration;

use log::{error, info, trace, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use crate::error::{Error, Result};

pub mod reconciler;

pub use reconciler::ChannelReconciler;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway connection plus the pieces the refresh loop needs from it: the
/// shared HTTP client, the guild cache, and a ready signal.
pub struct DiscordPlatform {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    ready_rx: watch::Receiver<bool>,
    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

/// Consumes gateway events: keeps the guild cache current and flips the
/// ready flag once Discord acknowledges the session.
async fn shard_runner(
    mut shard: Shard,
    cache: Arc<InMemoryCache>,
    ready_tx: watch::Sender<bool>,
) {
    let shard_id = shard.id().number();
    info!("shard {shard_id} started");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);
                match &event {
                    Event::Ready(ready) => {
                        info!(
                            "shard {shard_id} ready as {} ({} guilds)",
                            ready.user.name,
                            ready.guilds.len()
                        );
                        let _ = ready_tx.send(true);
                    }
                    other => {
                        trace!("shard {shard_id} event: {other:?}");
                    }
                }
            }
            Err(err) => {
                error!("shard {shard_id} error receiving event: {err:?}");
            }
        }
    }

    warn!("shard {shard_id} event loop ended");
}

impl DiscordPlatform {
    /// Connects to the gateway with the `GUILDS` intent and spawns one
    /// runner task per recommended shard.
    pub async fn connect(token: String) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Config("Discord bot token is empty".into()));
        }

        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(HTTP_TIMEOUT)
                .build(),
        );

        let cache = Arc::new(
            InMemoryCache::builder()
                .resource_types(ResourceType::GUILD)
                .build(),
        );

        let config = Config::new(token, Intents::GUILDS);
        let shards = gateway::create_recommended(&http, config, |_, builder| builder.build())
            .await
            .map_err(|e| Error::Gateway(format!("create_recommended failed: {e}")))?;

        let (ready_tx, ready_rx) = watch::channel(false);
        let mut shard_tasks = Vec::new();
        let mut shard_senders = Vec::new();

        for shard in shards {
            shard_senders.push(shard.sender());
            let cache_for_shard = cache.clone();
            let ready_for_shard = ready_tx.clone();
            shard_tasks.push(tokio::spawn(async move {
                shard_runner(shard, cache_for_shard, ready_for_shard).await;
            }));
        }

        Ok(Self { http, cache, ready_rx, shard_tasks, shard_senders })
    }

    /// Resolves once the gateway has delivered `Ready`. The refresh loop must
    /// not start before this.
    pub async fn wait_until_ready(&mut self) {
        while !*self.ready_rx.borrow() {
            if self.ready_rx.changed().await.is_err() {
                // Every shard runner is gone; nothing will flip the flag.
                return;
            }
        }
    }

    pub fn http(&self) -> Arc<HttpClient> {
        self.http.clone()
    }

    /// Guilds the bot is currently a member of, per the gateway cache.
    pub fn guild_ids(&self) -> Vec<Id<GuildMarker>> {
        self.cache.iter().guilds().map(|guild| guild.id()).collect()
    }

    /// Approximate member count via the HTTP API. `None` when Discord omits
    /// the count from the guild payload.
    pub async fn member_count(&self, guild_id: Id<GuildMarker>) -> Result<Option<u64>> {
        let guild = self
            .http
            .guild(guild_id)
            .with_counts(true)
            .await?
            .model()
            .await?;
        Ok(guild.approximate_member_count)
    }

    /// Closes every shard and waits for the runner tasks to drain.
    pub async fn shutdown(&mut self) {
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }
        self.shard_senders.clear();
        self.shard_tasks.clear();
    }
}
