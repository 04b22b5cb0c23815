use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::api::FetchError;

pub const API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Query parameters for the `coins/{id}` endpoint: market data only, with
/// every optional section switched off to keep the payload small.
const COIN_PARAMS: [(&str, &str); 6] = [
    ("localization", "false"),
    ("tickers", "false"),
    ("market_data", "true"),
    ("community_data", "false"),
    ("developer_data", "false"),
    ("sparkline", "false"),
];

#[derive(Debug, Deserialize)]
struct CoinResponse {
    market_data: Option<CoinGeckoMarketData>,
}

#[derive(Debug, Deserialize, Default)]
struct CoinGeckoMarketData {
    #[serde(default)]
    current_price: UsdQuote,
    #[serde(default)]
    total_volume: UsdQuote,
    #[serde(default)]
    market_cap: UsdQuote,
    price_change_percentage_24h: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct UsdQuote {
    usd: Option<f64>,
}

/// One cycle's worth of market data. Fields are independent: a quote the
/// endpoint omitted degrades that statistic alone, not the whole snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketSnapshot {
    pub price_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub change_24h_pct: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    coin_id: String,
}

impl CoinGeckoClient {
    pub fn new(client: Client, base_url: String, coin_id: String) -> Self {
        Self { client, base_url, coin_id }
    }

    /// Fetches the current USD quote set for the configured coin.
    pub async fn market_snapshot(&self) -> Result<MarketSnapshot, FetchError> {
        let query = COIN_PARAMS
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/coins/{}?{}", self.base_url, self.coin_id, query);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => {
                let payload: CoinResponse = response.json().await?;
                Ok(snapshot_from(payload))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited("coingecko")),
            status => Err(FetchError::Status { endpoint: "coingecko", status: status.as_u16() }),
        }
    }
}

fn snapshot_from(payload: CoinResponse) -> MarketSnapshot {
    let market_data = payload.market_data.unwrap_or_default();
    MarketSnapshot {
        price_usd: market_data.current_price.usd,
        volume_24h_usd: market_data.total_volume.usd,
        market_cap_usd: market_data.market_cap.usd,
        change_24h_pct: market_data.price_change_percentage_24h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "meowcoin",
        "market_data": {
            "current_price": {"usd": 0.001234, "btc": 0.00000002},
            "total_volume": {"usd": 98765.43},
            "market_cap": {"usd": 1234567.6},
            "price_change_percentage_24h": 5.67
        }
    }"#;

    #[test]
    fn snapshot_extracts_usd_quotes() {
        let payload: CoinResponse = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = snapshot_from(payload);
        assert_eq!(snapshot.price_usd, Some(0.001234));
        assert_eq!(snapshot.volume_24h_usd, Some(98765.43));
        assert_eq!(snapshot.market_cap_usd, Some(1234567.6));
        assert_eq!(snapshot.change_24h_pct, Some(5.67));
    }

    #[test]
    fn missing_quote_degrades_only_that_field() {
        let body = r#"{
            "market_data": {
                "current_price": {"usd": 0.001234},
                "total_volume": {},
                "price_change_percentage_24h": null
            }
        }"#;
        let payload: CoinResponse = serde_json::from_str(body).unwrap();
        let snapshot = snapshot_from(payload);
        assert_eq!(snapshot.price_usd, Some(0.001234));
        assert_eq!(snapshot.volume_24h_usd, None);
        assert_eq!(snapshot.market_cap_usd, None);
        assert_eq!(snapshot.change_24h_pct, None);
    }

    #[test]
    fn missing_market_data_yields_an_empty_snapshot() {
        let payload: CoinResponse = serde_json::from_str(r#"{"id": "meowcoin"}"#).unwrap();
        assert_eq!(snapshot_from(payload), MarketSnapshot::default());
    }
}
