use std::time::Duration;

use log::warn;
use reqwest::Client;
use thiserror::Error;

use crate::config::EndpointsConfig;
use crate::stats::{StatKey, StatValue};

pub mod coingecko;
pub mod rpc;
pub mod supply;

pub use coingecko::{CoinGeckoClient, MarketSnapshot};
pub use rpc::{Algorithm, RpcClient};
pub use supply::SupplyClient;

/// Why a single statistic could not be fetched this cycle. Always degraded to
/// [`StatValue::Unavailable`] at the aggregation point; never aborts the rest
/// of the cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited by {0}")]
    RateLimited(&'static str),
    #[error("{endpoint} endpoint returned status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("RPC {method} returned no result")]
    MissingResult { method: &'static str },
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Everything the dashboard shows, fetched once per tick. Fields hold the
/// already-normalized values; formatting happens downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    pub members: StatValue,
    pub difficulty_meowpow: StatValue,
    pub difficulty_scrypt: StatValue,
    pub hashrate_meowpow: StatValue,
    pub hashrate_scrypt: StatValue,
    pub block_height: StatValue,
    pub supply: StatValue,
    pub price: StatValue,
    pub volume_24h: StatValue,
    pub market_cap: StatValue,
}

impl NetworkStats {
    pub fn get(&self, key: StatKey) -> &StatValue {
        match key {
            StatKey::Members => &self.members,
            StatKey::DifficultyMeowpow => &self.difficulty_meowpow,
            StatKey::DifficultyScrypt => &self.difficulty_scrypt,
            StatKey::HashrateMeowpow => &self.hashrate_meowpow,
            StatKey::HashrateScrypt => &self.hashrate_scrypt,
            StatKey::BlockHeight => &self.block_height,
            StatKey::Supply => &self.supply,
            StatKey::Price => &self.price,
            StatKey::Volume24h => &self.volume_24h,
            StatKey::MarketCap => &self.market_cap,
        }
    }
}

/// Fetches every dashboard statistic from the node RPC, the legacy supply
/// endpoint and CoinGecko. One instance per process, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct StatsCollector {
    rpc: RpcClient,
    supply: SupplyClient,
    coingecko: CoinGeckoClient,
}

impl StatsCollector {
    pub fn new(config: &EndpointsConfig) -> crate::Result<Self> {
        // One shared client; its timeout bounds every upstream call.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            rpc: RpcClient::new(client.clone(), config.rpc_url.clone()),
            supply: SupplyClient::new(client.clone(), config.supply_url.clone()),
            coingecko: CoinGeckoClient::new(
                client,
                config.coingecko_url.clone(),
                config.coingecko_coin_id.clone(),
            ),
        })
    }

    /// Fetches all statistics for one tick. Calls are sequential and each one
    /// is isolated: a failure degrades that statistic to `N/A` and the rest
    /// keep going. The member count comes from the platform side and is
    /// passed in.
    pub async fn fetch_all(&self, member_count: Option<u64>) -> NetworkStats {
        let members = match member_count {
            Some(count) => StatValue::Number(count as f64),
            None => StatValue::Unavailable,
        };

        let difficulty_meowpow =
            degrade(self.rpc.difficulty(Algorithm::MeowPow).await, "difficulty (meowpow)");
        let difficulty_scrypt =
            degrade(self.rpc.difficulty(Algorithm::Scrypt).await, "difficulty (scrypt)");
        let hashrate_meowpow = degrade(
            self.rpc.network_hashrate_ghps(Algorithm::MeowPow).await,
            "hashrate (meowpow)",
        );
        let hashrate_scrypt = degrade(
            self.rpc.network_hashrate_ghps(Algorithm::Scrypt).await,
            "hashrate (scrypt)",
        );
        let block_height = degrade(self.rpc.block_count().await, "block count");
        let supply = degrade(self.supply.circulating_supply().await, "coin supply");

        let snapshot = match self.coingecko.market_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("failed to fetch market data: {e}");
                MarketSnapshot::default()
            }
        };
        let price = match snapshot.price_usd {
            Some(price) => StatValue::Display(price_display(price, snapshot.change_24h_pct)),
            None => StatValue::Unavailable,
        };
        let volume_24h = snapshot.volume_24h_usd.map(StatValue::Number).unwrap_or(StatValue::Unavailable);
        let market_cap = snapshot.market_cap_usd.map(StatValue::Number).unwrap_or(StatValue::Unavailable);

        NetworkStats {
            members,
            difficulty_meowpow,
            difficulty_scrypt,
            hashrate_meowpow,
            hashrate_scrypt,
            block_height,
            supply,
            price,
            volume_24h,
            market_cap,
        }
    }
}

fn degrade(result: Result<f64, FetchError>, what: &str) -> StatValue {
    match result {
        Ok(value) => StatValue::Number(value),
        Err(e) => {
            warn!("failed to fetch {what}: {e}");
            StatValue::Unavailable
        }
    }
}

/// Assembles the price readout, embedding the 24h direction and percentage
/// when the endpoint reported one.
pub fn price_display(price_usd: f64, change_24h_pct: Option<f64>) -> String {
    match change_24h_pct {
        Some(pct) if pct >= 0.0 => format!("${price_usd:.6} (▲ +{pct:.2}% 24h)"),
        Some(pct) => format!("${price_usd:.6} (▼ {pct:.2}% 24h)"),
        None => format!("${price_usd:.6}"),
    }
}
