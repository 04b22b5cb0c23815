use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::coingecko::API_BASE_URL;
use crate::error::{Error, Result};

/// Environment variable holding the bot token; overrides the config file.
pub const TOKEN_ENV_VAR: &str = "DISCORD_BOT_TOKEN";

pub const DEFAULT_RPC_URL: &str = "https://mewc-rpc-mainnet.mewccrypto.com/rpc";
pub const DEFAULT_SUPPLY_URL: &str = "https://mewc.cryptoscope.io/api/getcoinsupply";
pub const DEFAULT_CATEGORY: &str = "Meowcoin Server Stats";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub endpoints: EndpointsConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DiscordConfig {
    /// Usually left empty here and supplied via `DISCORD_BOT_TOKEN`.
    pub bot_token: String,
    /// Name of the category the stat channels live under.
    pub stats_category: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub rpc_url: String,
    pub supply_url: String,
    pub coingecko_url: String,
    pub coingecko_coin_id: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles.
    pub interval_secs: u64,
    /// Minimum milliseconds between consecutive Discord mutations.
    pub pacing_ms: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self { bot_token: String::new(), stats_category: DEFAULT_CATEGORY.to_string() }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            supply_url: DEFAULT_SUPPLY_URL.to_string(),
            coingecko_url: API_BASE_URL.to_string(),
            coingecko_coin_id: "meowcoin".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 300, pacing_ms: 500 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            endpoints: EndpointsConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&config_str).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// The bot token, preferring the environment over the file. Empty both
    /// ways is a startup error.
    pub fn resolve_token(&self, env_value: Option<String>) -> Result<String> {
        let token = env_value
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.discord.bot_token.clone());
        if token.is_empty() {
            return Err(Error::Config(format!(
                "no bot token: set {TOKEN_ENV_VAR} or discord.bot_token"
            )));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_mainnet() {
        let config = Config::default();
        assert_eq!(config.endpoints.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.endpoints.coingecko_coin_id, "meowcoin");
        assert_eq!(config.discord.stats_category, "Meowcoin Server Stats");
        assert_eq!(config.refresh.interval_secs, 300);
        assert_eq!(config.refresh.pacing_ms, 500);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [refresh]
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.refresh.pacing_ms, 500);
        assert_eq!(config.endpoints.supply_url, DEFAULT_SUPPLY_URL);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.refresh.interval_secs, config.refresh.interval_secs);
        assert_eq!(parsed.endpoints.rpc_url, config.endpoints.rpc_url);
    }

    #[test]
    fn env_token_overrides_file_token() {
        let mut config = Config::default();
        config.discord.bot_token = "from-file".to_string();
        let token = config.resolve_token(Some("from-env".to_string())).unwrap();
        assert_eq!(token, "from-env");
    }

    #[test]
    fn file_token_is_the_fallback() {
        let mut config = Config::default();
        config.discord.bot_token = "from-file".to_string();
        assert_eq!(config.resolve_token(None).unwrap(), "from-file");
        assert_eq!(config.resolve_token(Some(String::new())).unwrap(), "from-file");
    }

    #[test]
    fn missing_token_is_an_error() {
        let config = Config::default();
        assert!(config.resolve_token(None).is_err());
    }
}
