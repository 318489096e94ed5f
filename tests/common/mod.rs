//! Common test utilities: a mock Alchemy API and dumper construction

use std::path::Path;

use nft_dump::{Config, Dumper};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// API key baked into every mocked URL
pub const API_KEY: &str = "integration-key";

/// Contract address used throughout the integration tests
pub const ADDRESS: &str = "0x26BAdF693F2b103B021c670c852262b379bBBE8A";

/// Metadata payload served for token `id`
pub fn token_payload(id: u64) -> Value {
    json!({
        "contract": { "address": ADDRESS },
        "id": { "tokenId": id.to_string() },
        "title": format!("m{id}"),
    })
}

/// Serve `totalSupply()` as an ABI-encoded uint256
pub async fn mount_total_supply(server: &MockServer, supply: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/v2/{API_KEY}")))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("0x{supply:064x}"),
        })))
        .mount(server)
        .await;
}

/// Make `totalSupply()` revert
pub async fn mount_reverting_supply(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/v2/{API_KEY}")))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted" },
        })))
        .mount(server)
        .await;
}

/// Serve the collection name
pub async fn mount_collection_name(server: &MockServer, name: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/v2/{API_KEY}")))
        .and(body_partial_json(json!({ "method": "alchemy_getTokenMetadata" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "name": name, "symbol": "TST", "decimals": 0, "logo": null },
        })))
        .mount(server)
        .await;
}

/// Serve metadata for tokens `0..count`, answering HTTP 500 for `failing`
pub async fn mount_tokens(server: &MockServer, count: u64, failing: &[u64]) {
    for id in 0..count {
        let response = if failing.contains(&id) {
            ResponseTemplate::new(500).set_body_string("upstream timeout")
        } else {
            ResponseTemplate::new(200).set_body_json(token_payload(id))
        };
        Mock::given(method("GET"))
            .and(path(format!("/nft/v2/{API_KEY}/getNFTMetadata")))
            .and(query_param("contractAddress", ADDRESS))
            .and(query_param("tokenId", id.to_string()))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Build a dumper pointed at `server`, writing into `output_dir`
pub fn dumper_for(server: &MockServer, output_dir: &Path, concurrency: usize) -> Dumper {
    let mut config = Config::default();
    config.alchemy.api_key = API_KEY.to_string();
    config.alchemy.base_url = Some(server.uri());
    config.dump.concurrency = concurrency;
    config.dump.output_dir = output_dir.to_path_buf();
    Dumper::new(config).expect("valid test configuration")
}

/// Read the written aggregate back as JSON
pub fn read_document(path: &Path) -> Value {
    let bytes = std::fs::read(path).expect("aggregate file should exist");
    serde_json::from_slice(&bytes).expect("aggregate file should be valid JSON")
}
