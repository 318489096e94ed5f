//! Dump orchestration -- supply resolution, bounded fetching, aggregation and persistence.
//!
//! Phases of a run:
//! 1. Resolve the token count (fatal on failure, before any token request)
//! 2. Resolve the collection name (best effort, only used for the file name)
//! 3. Fetch every token through the bounded pool
//! 4. Aggregate outcomes, reporting failures without discarding successes
//! 5. Persist the aggregate once

use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::{Aggregate, aggregate};
use crate::alchemy::AlchemyClient;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{ItemFetcher, MetadataProvider};
use crate::pool::BoundedPool;
use crate::sink::{JsonFileSink, Sink};
use crate::supply::{CollectionNameSource, SupplySource, resolve_supply};
use crate::types::{CollectionIdentity, Event, ItemId};

/// Buffer size of the progress event channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum number of failed ids spelled out in the summary log line
const MAX_LOGGED_FAILED_IDS: usize = 20;

/// Remote collaborators and the output sink used by a [`Dumper`]
#[derive(Clone)]
pub struct DumpServices {
    /// Total supply lookup
    pub supply: Arc<dyn SupplySource>,
    /// Collection name lookup
    pub names: Arc<dyn CollectionNameSource>,
    /// Per-token metadata lookup
    pub metadata: Arc<dyn MetadataProvider>,
    /// Aggregate destination
    pub sink: Arc<dyn Sink>,
}

/// Everything fetched for one collection, before persistence
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedDump {
    /// Collection the tokens belong to
    pub collection: CollectionIdentity,
    /// Ordered successes plus failures
    pub aggregate: Aggregate,
}

/// Summary of a completed run
#[derive(Clone, Debug, PartialEq)]
pub struct DumpReport {
    /// Collection that was dumped
    pub collection: CollectionIdentity,
    /// Tokens requested
    pub requested: u64,
    /// Tokens whose metadata was saved
    pub succeeded: u64,
    /// Tokens that failed, ascending
    pub failed_ids: Vec<ItemId>,
    /// File the aggregate was written to
    pub output_path: PathBuf,
}

impl DumpReport {
    /// Number of failed tokens
    pub fn failed(&self) -> u64 {
        self.failed_ids.len() as u64
    }
}

/// Dumps the metadata of every token in a collection.
#[derive(Clone)]
pub struct Dumper {
    config: Arc<Config>,
    services: DumpServices,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl Dumper {
    /// Validate `config` and wire the Alchemy client plus a JSON file sink
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(AlchemyClient::new(&config.alchemy, &config.dump)?);
        let sink = Arc::new(JsonFileSink::new(config.dump.output_dir.clone()));
        let services = DumpServices {
            supply: client.clone(),
            names: client.clone(),
            metadata: client,
            sink,
        };
        Ok(Self::with_services(config, services))
    }

    /// Build a dumper around explicit collaborators
    pub fn with_services(config: Config, services: DumpServices) -> Self {
        let (event_tx, _) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            services,
            event_tx,
        }
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve, fetch and aggregate without persisting.
    ///
    /// Fails only when the token count cannot be determined; individual token
    /// failures end up in the returned aggregate.
    pub async fn collect(
        &self,
        address: &str,
        override_count: Option<u64>,
    ) -> Result<CollectedDump> {
        // Phase 1: token count
        let count =
            resolve_supply(self.services.supply.as_ref(), address, override_count).await?;

        // Phase 2: collection name
        let name = match self.services.names.collection_name(address).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(
                    address,
                    error = %e,
                    "Failed to resolve collection name, using address"
                );
                None
            }
        };
        let collection = CollectionIdentity::new(name, address);

        tracing::info!(
            count,
            name = %collection.name,
            address,
            "Retrieving NFT metadata"
        );
        self.event_tx
            .send(Event::Started {
                collection: collection.clone(),
                count,
            })
            .ok();

        // Phase 3: bounded fan-out
        let fetcher =
            ItemFetcher::new(Arc::clone(&self.services.metadata), self.event_tx.clone());
        let fetcher = &fetcher;
        let outcomes = BoundedPool::new(self.config.dump.concurrency)
            .run(ItemId::range(count), move |id| fetcher.fetch(address, id))
            .await;

        // Phase 4: aggregate
        let aggregate = aggregate(count, outcomes);
        self.report_completion(&aggregate);

        Ok(CollectedDump {
            collection,
            aggregate,
        })
    }

    /// Write a collected aggregate to the sink.
    ///
    /// The aggregate stays with the caller, so a failed write loses nothing
    /// but the file.
    pub async fn persist(&self, collected: &CollectedDump) -> Result<PathBuf> {
        match self
            .services
            .sink
            .write(&collected.aggregate, &collected.collection)
            .await
        {
            Ok(path) => {
                self.event_tx.send(Event::Saved { path: path.clone() }).ok();
                Ok(path)
            }
            Err(e) => {
                tracing::error!(
                    name = %collected.collection.name,
                    error = %e,
                    "Failed to save NFT metadata"
                );
                Err(e)
            }
        }
    }

    /// Run a full dump: collect, then persist even if some tokens failed.
    pub async fn run(&self, address: &str, override_count: Option<u64>) -> Result<DumpReport> {
        let collected = self.collect(address, override_count).await?;
        let output_path = self.persist(&collected).await?;

        let CollectedDump {
            collection,
            aggregate,
        } = collected;
        Ok(DumpReport {
            collection,
            requested: aggregate.requested(),
            succeeded: aggregate.succeeded(),
            failed_ids: aggregate.failed_ids().collect(),
            output_path,
        })
    }

    fn report_completion(&self, aggregate: &Aggregate) {
        let requested = aggregate.requested();
        let succeeded = aggregate.succeeded();
        let failed = aggregate.failed();

        if failed > 0 {
            let sample: Vec<u64> = aggregate
                .failed_ids()
                .take(MAX_LOGGED_FAILED_IDS)
                .map(u64::from)
                .collect();
            tracing::warn!(
                requested,
                succeeded,
                failed,
                failed_ids = ?sample,
                first_error = %aggregate.failures()[0].error,
                "Failed to get all NFT metadata"
            );
        } else {
            tracing::info!(requested, succeeded, "Retrieved all NFT metadata");
        }

        self.event_tx
            .send(Event::Completed {
                requested,
                succeeded,
                failed,
            })
            .ok();
    }
}
