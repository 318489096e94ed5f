//! `nft-dump` command-line front end.
//!
//! ```text
//! nft-dump <KEY> <ADDRESS> [MAX]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nft_dump::{Config, Dumper};

/// Dump NFT metadata for every token of a collection
#[derive(Debug, Parser)]
#[command(name = "nft-dump", version, about)]
#[command(
    after_help = "Example:\n  nft-dump $ALCHEMY_KEY 0x26BAdF693F2b103B021c670c852262b379bBBE8A"
)]
struct Cli {
    /// Alchemy API key
    #[arg(env = "ALCHEMY_API_KEY", hide_env_values = true)]
    key: String,

    /// NFT contract address to dump
    address: String,

    /// Maximum number of NFTs to dump (defaults to the contract's totalSupply)
    max: Option<u64>,

    /// Maximum number of metadata requests in flight
    #[arg(long, short = 'c', default_value_t = 100)]
    concurrency: usize,

    /// Directory the metadata file is written to
    #[arg(long, short = 'o', default_value = "output")]
    output_dir: PathBuf,

    /// Alchemy network subdomain
    #[arg(long, default_value = "eth-mainnet")]
    network: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Override the API origin (testing / proxies)
    #[arg(long, hide = true)]
    base_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> (Config, String, Option<u64>) {
        let mut config = Config::default();
        config.alchemy.api_key = self.key;
        config.alchemy.network = self.network;
        config.alchemy.base_url = self.base_url;
        config.alchemy.request_timeout = Duration::from_secs(self.timeout);
        config.dump.concurrency = self.concurrency;
        config.dump.output_dir = self.output_dir;
        (config, self.address, self.max)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let (config, address, max) = Cli::parse().into_config();

    match run(config, &address, max).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let chain = format!("{e:#}");
            tracing::error!(error = %chain, "Dump failed");
            let code = e
                .downcast_ref::<nft_dump::Error>()
                .map(nft_dump::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(config: Config, address: &str, max: Option<u64>) -> anyhow::Result<()> {
    let dumper = Dumper::new(config).context("invalid configuration")?;
    let report = dumper
        .run(address, max)
        .await
        .with_context(|| format!("dumping {address}"))?;

    tracing::info!(
        requested = report.requested,
        succeeded = report.succeeded,
        failed = report.failed(),
        path = %report.output_path.display(),
        "Dump finished"
    );
    if report.failed() > 0 {
        tracing::warn!(
            failed_ids = ?report.failed_ids,
            "Some tokens could not be retrieved and are missing from the output"
        );
    }
    Ok(())
}
