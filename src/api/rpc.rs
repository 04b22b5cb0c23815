use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::FetchError;

/// Mining algorithms the chain reports consensus statistics for. The RPC
/// interface addresses them either by index (`getdifficulty`) or by name
/// (`getnetworkhashps`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    MeowPow,
    Scrypt,
}

impl Algorithm {
    pub fn index(self) -> u64 {
        match self {
            Algorithm::MeowPow => 0,
            Algorithm::Scrypt => 1,
        }
    }

    pub fn rpc_name(self) -> &'static str {
        match self {
            Algorithm::MeowPow => "meowpow",
            Algorithm::Scrypt => "scrypt",
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
}

/// JSON-RPC client for the Meowcoin node endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    url: String,
}

impl RpcClient {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    async fn call(&self, method: &'static str, params: Value) -> Result<Value, FetchError> {
        let request = RpcRequest { method, params };
        debug!("RPC {} -> {}", method, self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint: "rpc", status: status.as_u16() });
        }
        let payload: RpcResponse = response.json().await?;
        match payload.result {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(FetchError::MissingResult { method }),
        }
    }

    async fn call_f64(&self, method: &'static str, params: Value) -> Result<f64, FetchError> {
        let value = self.call(method, params).await?;
        value
            .as_f64()
            .ok_or_else(|| FetchError::MalformedPayload(format!("{method} result is not numeric: {value}")))
    }

    /// `getdifficulty [0|1]`.
    pub async fn difficulty(&self, algorithm: Algorithm) -> Result<f64, FetchError> {
        self.call_f64("getdifficulty", json!([algorithm.index()])).await
    }

    /// `getnetworkhashps [0, -1, "<algo>"]`, normalized from H/s to GH/s.
    pub async fn network_hashrate_ghps(&self, algorithm: Algorithm) -> Result<f64, FetchError> {
        let raw = self
            .call_f64("getnetworkhashps", json!([0, -1, algorithm.rpc_name()]))
            .await?;
        Ok(raw / 1e9)
    }

    /// `getblockcount []`.
    pub async fn block_count(&self) -> Result<f64, FetchError> {
        self.call_f64("getblockcount", json!([])).await
    }
}
