use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::api::FetchError;

/// The explorer reports supply in raw units; one MEWC is 1e9 of them, so the
/// divided value is already denominated in billions for display.
const RAW_UNITS_PER_BILLION: f64 = 1e9;

#[derive(Debug, Deserialize)]
struct SupplyResponse {
    /// The endpoint has been observed returning this both as a JSON number
    /// and as a quoted string.
    coinsupply: Value,
}

/// Client for the legacy block-explorer supply endpoint. Still the only
/// source for circulating supply; everything else moved to the node RPC.
#[derive(Debug, Clone)]
pub struct SupplyClient {
    client: Client,
    url: String,
}

impl SupplyClient {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    /// Circulating supply in billions of MEWC.
    pub async fn circulating_supply(&self) -> Result<f64, FetchError> {
        debug!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint: "supply", status: status.as_u16() });
        }
        let payload: SupplyResponse = response.json().await?;
        parse_supply(&payload)
    }
}

fn parse_supply(payload: &SupplyResponse) -> Result<f64, FetchError> {
    let raw = match &payload.coinsupply {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        FetchError::MalformedPayload(format!("coinsupply is not numeric: {}", payload.coinsupply))
    })?;
    Ok(raw / RAW_UNITS_PER_BILLION)
}
