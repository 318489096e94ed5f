//! Configuration types for nft-dump

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Alchemy API access settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlchemyConfig {
    /// Alchemy API key (required)
    #[serde(default)]
    pub api_key: String,

    /// Network subdomain, e.g. "eth-mainnet" or "polygon-mainnet" (default: "eth-mainnet")
    #[serde(default = "default_network")]
    pub network: String,

    /// Override for the API origin (default: `https://{network}.g.alchemy.com`)
    ///
    /// Both the NFT REST endpoints and the JSON-RPC endpoint are resolved
    /// relative to this origin.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Timeout applied to every HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for AlchemyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            network: default_network(),
            base_url: None,
            request_timeout: default_request_timeout(),
        }
    }
}

impl AlchemyConfig {
    /// API origin, honouring the `base_url` override
    pub fn origin(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.g.alchemy.com", self.network),
        }
    }
}

/// Dump behavior (concurrency and output location)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Maximum number of metadata requests in flight at once (default: 100)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Directory the aggregate file is written to, created if absent (default: "output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Token standard requested from the metadata API (default: "erc721")
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            token_type: default_token_type(),
        }
    }
}

/// Main configuration for [`Dumper`](crate::Dumper)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API access
    #[serde(default)]
    pub alchemy: AlchemyConfig,

    /// Concurrency and output settings
    #[serde(default)]
    pub dump: DumpConfig,
}

impl Config {
    /// Reject settings that would make a run impossible
    pub fn validate(&self) -> Result<()> {
        if self.alchemy.api_key.trim().is_empty() {
            return Err(Error::config("alchemy.api_key", "API key must not be empty"));
        }
        if self.dump.concurrency == 0 {
            return Err(Error::config(
                "dump.concurrency",
                "concurrency must be at least 1",
            ));
        }
        if self.alchemy.request_timeout.is_zero() {
            return Err(Error::config(
                "alchemy.request_timeout",
                "request timeout must be greater than zero",
            ));
        }
        let origin = self.alchemy.origin();
        url::Url::parse(&origin).map_err(|e| {
            Error::config("alchemy.base_url", format!("invalid API origin {origin}: {e}"))
        })?;
        Ok(())
    }
}

fn default_network() -> String {
    "eth-mainnet".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_concurrency() -> usize {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_token_type() -> String {
    "erc721".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
