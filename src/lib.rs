//! # nft-dump
//!
//! Dumps per-token metadata for every token in an NFT collection.
//!
//! ## How a run works
//!
//! 1. The total supply is taken from an explicit override or read from the
//!    contract (`totalSupply()` via JSON-RPC).
//! 2. Token ids `0..count` are pushed through a bounded pool that keeps at most
//!    `concurrency` metadata requests in flight.
//! 3. Every token yields exactly one outcome. Failures are recorded, never
//!    allowed to cancel sibling requests.
//! 4. Successful payloads are aggregated in token order and written to a single
//!    JSON file, even when some tokens failed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nft_dump::{Config, Dumper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.alchemy.api_key = "demo-key".to_string();
//!
//!     let dumper = Dumper::new(config)?;
//!
//!     let mut events = dumper.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = dumper
//!         .run("0x26BAdF693F2b103B021c670c852262b379bBBE8A", Some(10))
//!         .await?;
//!     println!("{} of {} tokens saved", report.succeeded, report.requested);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Result aggregation
pub mod aggregate;
/// Alchemy HTTP client
pub mod alchemy;
/// Configuration types
pub mod config;
/// Run orchestration
pub mod dumper;
/// Error types
pub mod error;
/// Per-token metadata fetching
pub mod fetcher;
/// Bounded-concurrency execution
pub mod pool;
/// Aggregate persistence
pub mod sink;
/// Total supply resolution
pub mod supply;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregate::{Aggregate, FailedItem, aggregate};
pub use alchemy::AlchemyClient;
pub use config::{AlchemyConfig, Config, DumpConfig};
pub use dumper::{CollectedDump, DumpReport, DumpServices, Dumper};
pub use error::{Error, FetchError, Result};
pub use fetcher::{ItemFetcher, MetadataProvider};
pub use pool::BoundedPool;
pub use sink::{JsonFileSink, Sink};
pub use supply::{CollectionNameSource, SupplySource, parse_supply, resolve_supply};
pub use types::{CollectionIdentity, Event, FetchOutcome, ItemId, ItemMetadata};
