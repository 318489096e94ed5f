//! Alchemy API client.
//!
//! Implements the three remote collaborators a dump needs:
//! - [`MetadataProvider`]: NFT REST `getNFTMetadata`
//! - [`SupplySource`]: JSON-RPC `eth_call` of `totalSupply()`
//! - [`CollectionNameSource`]: JSON-RPC `alchemy_getTokenMetadata`

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::{AlchemyConfig, DumpConfig};
use crate::error::{Error, FetchError, Result};
use crate::fetcher::MetadataProvider;
use crate::supply::{CollectionNameSource, SupplySource};
use crate::types::{ItemId, ItemMetadata};

/// ABI selector of `totalSupply()` (ERC-721 Enumerable)
pub const TOTAL_SUPPLY_SELECTOR: &str = "0x18160ddd";

/// HTTP client for the Alchemy NFT and JSON-RPC endpoints.
///
/// The API key is part of every URL, so this type deliberately has no `Debug`.
pub struct AlchemyClient {
    http: reqwest::Client,
    nft_metadata_url: String,
    rpc_url: String,
    token_type: String,
    next_rpc_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct TokenMetadata {
    #[serde(default)]
    name: Option<String>,
}

impl AlchemyClient {
    /// Build a client from configuration
    pub fn new(alchemy: &AlchemyConfig, dump: &DumpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(alchemy.request_timeout)
            .build()?;
        let origin = alchemy.origin();
        Ok(Self {
            http,
            nft_metadata_url: format!("{origin}/nft/v2/{}/getNFTMetadata", alchemy.api_key),
            rpc_url: format!("{origin}/v2/{}", alchemy.api_key),
            token_type: dump.token_type.clone(),
            next_rpc_id: AtomicU64::new(1),
        })
    }

    /// Issue a JSON-RPC call and return its `result`
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_rpc_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.http.post(&self.rpc_url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "{method} returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(Error::Remote(format!(
                "{method} failed ({}): {}",
                err.code, err.message
            )));
        }
        body.result
            .ok_or_else(|| Error::Remote(format!("{method} returned no result")))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for AlchemyClient {
    async fn nft_metadata(
        &self,
        address: &str,
        id: ItemId,
    ) -> std::result::Result<ItemMetadata, FetchError> {
        let token_id = id.0.to_string();
        let response = self
            .http
            .get(&self.nft_metadata_url)
            .query(&[
                ("contractAddress", address),
                ("tokenId", token_id.as_str()),
                ("tokenType", self.token_type.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match body.trim() {
                "" => status.canonical_reason().unwrap_or("request failed").to_string(),
                trimmed => trimmed.to_string(),
            };
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl SupplySource for AlchemyClient {
    async fn total_supply(&self, address: &str) -> Result<String> {
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": address, "data": TOTAL_SUPPLY_SELECTOR }, "latest"]),
            )
            .await?;
        match result {
            Value::String(raw) => Ok(raw),
            other => Err(Error::Remote(format!(
                "eth_call returned a non-string result: {other}"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl CollectionNameSource for AlchemyClient {
    async fn collection_name(&self, address: &str) -> Result<Option<String>> {
        let result = self
            .rpc_call("alchemy_getTokenMetadata", json!([address]))
            .await?;
        let metadata: TokenMetadata = serde_json::from_value(result)?;
        Ok(metadata.name.filter(|n| !n.trim().is_empty()))
    }
}
