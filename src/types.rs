//! Core types for nft-dump

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Token id within a collection, in `[0, count)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Every id of a collection holding `count` tokens, ascending
    pub fn range(count: u64) -> impl Iterator<Item = ItemId> {
        (0..count).map(ItemId)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata document returned by the remote API for one token
///
/// Passed through untouched; the pipeline never looks inside it.
pub type ItemMetadata = serde_json::Value;

/// Result of fetching a single token
///
/// Exactly one outcome exists per submitted [`ItemId`]. Both variants carry
/// their id so results can be ordered regardless of completion order.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Metadata was retrieved
    Success {
        /// Token id
        id: ItemId,
        /// Opaque metadata document
        metadata: ItemMetadata,
    },
    /// Lookup failed; recorded, never retried
    Failure {
        /// Token id
        id: ItemId,
        /// Why the lookup failed
        error: FetchError,
    },
}

impl FetchOutcome {
    /// Token id this outcome belongs to
    pub fn id(&self) -> ItemId {
        match self {
            FetchOutcome::Success { id, .. } | FetchOutcome::Failure { id, .. } => *id,
        }
    }

    /// Whether metadata was retrieved
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Identity of the collection being dumped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionIdentity {
    /// Human-readable collection name (falls back to the address)
    pub name: String,
    /// Contract address as given on input
    pub address: String,
}

impl CollectionIdentity {
    /// Build an identity, using the address when no usable name is known
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| address.clone());
        Self { name, address }
    }
}

/// Progress events published while a dump runs
///
/// Purely observational; dropping every event never changes the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Supply resolved and collection identified; fetching is about to start
    Started {
        /// Collection being dumped
        collection: CollectionIdentity,
        /// Number of tokens that will be requested
        count: u64,
    },

    /// Request for a token is about to be issued
    Fetching {
        /// Token id
        id: ItemId,
    },

    /// Metadata for a token was received
    Fetched {
        /// Token id
        id: ItemId,
    },

    /// Metadata for a token could not be retrieved
    FetchFailed {
        /// Token id
        id: ItemId,
        /// Error message
        error: String,
    },

    /// Every token has an outcome
    Completed {
        /// Tokens requested
        requested: u64,
        /// Tokens whose metadata was retrieved
        succeeded: u64,
        /// Tokens that failed
        failed: u64,
    },

    /// Aggregate written to disk
    Saved {
        /// Destination file
        path: std::path::PathBuf,
    },
}
