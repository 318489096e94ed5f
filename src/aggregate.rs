//! Result aggregation: partition outcomes into an ordered aggregate.

use serde::Serialize;

use crate::error::FetchError;
use crate::types::{FetchOutcome, ItemId, ItemMetadata};

/// A token whose metadata could not be retrieved
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedItem {
    /// Token id
    pub id: ItemId,
    /// Why the lookup failed
    pub error: FetchError,
}

/// Combined result of one run.
///
/// Successful payloads and failures are both kept in ascending id order, so
/// the content is identical no matter in which order the requests completed.
/// `requested()` is the number of ids submitted, not the number of outcomes
/// received; [`Aggregate::unaccounted`] is zero only when every submitted id
/// produced exactly one outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregate {
    requested: u64,
    items: Vec<(ItemId, ItemMetadata)>,
    failures: Vec<FailedItem>,
}

/// Partition the outcomes of `requested` submitted ids into successes and
/// failures.
///
/// A dropped or duplicated outcome is a pool bug: it trips a debug assertion
/// and is logged in release builds.
pub fn aggregate(requested: u64, outcomes: Vec<FetchOutcome>) -> Aggregate {
    let mut items = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            FetchOutcome::Success { id, metadata } => items.push((id, metadata)),
            FetchOutcome::Failure { id, error } => failures.push(FailedItem { id, error }),
        }
    }

    items.sort_by_key(|(id, _)| *id);
    failures.sort_by_key(|f| f.id);

    let aggregate = Aggregate {
        requested,
        items,
        failures,
    };

    let unaccounted = aggregate.unaccounted();
    if unaccounted != 0 {
        tracing::error!(
            requested,
            succeeded = aggregate.succeeded(),
            failed = aggregate.failed(),
            unaccounted,
            "Outcome count does not match submitted ids"
        );
    }
    debug_assert_eq!(
        unaccounted, 0,
        "every submitted id must produce exactly one outcome"
    );

    aggregate
}

impl Aggregate {
    /// Number of token ids submitted
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Submitted ids without exactly one outcome: missing ids plus
    /// duplicated or out-of-range outcomes
    pub fn unaccounted(&self) -> u64 {
        let mut seen = std::collections::HashSet::with_capacity(
            self.items.len() + self.failures.len(),
        );
        let mut stray = 0u64;
        for id in self.item_ids().chain(self.failed_ids()) {
            if id.get() >= self.requested || !seen.insert(id) {
                stray += 1;
            }
        }
        (self.requested - seen.len() as u64) + stray
    }

    /// Number of tokens whose metadata was retrieved
    pub fn succeeded(&self) -> u64 {
        self.items.len() as u64
    }

    /// Number of tokens that failed
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    /// True when no token failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Successful payloads in id order
    pub fn items(&self) -> impl Iterator<Item = &ItemMetadata> {
        self.items.iter().map(|(_, metadata)| metadata)
    }

    /// Ids of the successful tokens, ascending
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|(id, _)| *id)
    }

    /// Failed tokens, ascending by id
    pub fn failures(&self) -> &[FailedItem] {
        &self.failures
    }

    /// Ids of the failed tokens, ascending
    pub fn failed_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.failures.iter().map(|f| f.id)
    }

    /// Serialized output document: a JSON array of the successful payloads
    pub fn to_document(&self) -> serde_json::Result<Vec<u8>> {
        let payloads: Vec<&ItemMetadata> = self.items().collect();
        serde_json::to_vec(&payloads)
    }
}
