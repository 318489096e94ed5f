//! Per-token metadata fetching.

use std::sync::Arc;

use crate::error::FetchError;
use crate::types::{Event, FetchOutcome, ItemId, ItemMetadata};

/// Abstraction over the remote metadata API, enabling testability.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Issue exactly one lookup for `id` in the collection at `address`.
    async fn nft_metadata(
        &self,
        address: &str,
        id: ItemId,
    ) -> std::result::Result<ItemMetadata, FetchError>;
}

/// Turns one token id into one [`FetchOutcome`].
///
/// Errors are caught here and returned as [`FetchOutcome::Failure`], so a
/// failing token can never tear down the requests running next to it.
#[derive(Clone)]
pub struct ItemFetcher {
    provider: Arc<dyn MetadataProvider>,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl ItemFetcher {
    /// Create a fetcher that publishes progress on `event_tx`
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        event_tx: tokio::sync::broadcast::Sender<Event>,
    ) -> Self {
        Self { provider, event_tx }
    }

    /// Fetch metadata for a single token. Never retries.
    pub async fn fetch(&self, address: &str, id: ItemId) -> FetchOutcome {
        tracing::info!(token_id = id.0, "Retrieving NFT metadata");
        self.event_tx.send(Event::Fetching { id }).ok();

        match self.provider.nft_metadata(address, id).await {
            Ok(metadata) => {
                tracing::info!(token_id = id.0, "Received NFT metadata");
                self.event_tx.send(Event::Fetched { id }).ok();
                FetchOutcome::Success { id, metadata }
            }
            Err(error) => {
                tracing::warn!(token_id = id.0, error = %error, "Failed to get NFT metadata");
                self.event_tx
                    .send(Event::FetchFailed {
                        id,
                        error: error.to_string(),
                    })
                    .ok();
                FetchOutcome::Failure { id, error }
            }
        }
    }
}
