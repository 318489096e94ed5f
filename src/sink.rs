//! Aggregate persistence.

use std::path::{Path, PathBuf};

use crate::aggregate::Aggregate;
use crate::error::{Error, Result};
use crate::types::CollectionIdentity;

/// Destination for the aggregate of a run. Written once per run, never retried.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Persist `aggregate` and return where it went
    async fn write(
        &self,
        aggregate: &Aggregate,
        collection: &CollectionIdentity,
    ) -> Result<PathBuf>;
}

/// Writes `{output_dir}/{name}-{count}-metadata.json`
#[derive(Clone, Debug)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    /// Create a sink rooted at `output_dir` (created on first write if absent)
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full path the aggregate of `collection` with `count` tokens is written to
    pub fn path_for(&self, collection: &CollectionIdentity, count: u64) -> PathBuf {
        self.output_dir.join(output_file_name(&collection.name, count))
    }
}

#[async_trait::async_trait]
impl Sink for JsonFileSink {
    async fn write(
        &self,
        aggregate: &Aggregate,
        collection: &CollectionIdentity,
    ) -> Result<PathBuf> {
        let path = self.path_for(collection, aggregate.requested());
        let document = aggregate.to_document()?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| Error::AggregateWrite {
                path: self.output_dir.clone(),
                source,
            })?;

        tokio::fs::write(&path, &document)
            .await
            .map_err(|source| Error::AggregateWrite {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            bytes = document.len(),
            items = aggregate.succeeded(),
            "JSON data is saved"
        );
        Ok(path)
    }
}

/// File name for a collection's aggregate.
///
/// Characters that are not valid in a file name on common platforms are
/// replaced with `_`.
pub fn output_file_name(collection_name: &str, count: u64) -> String {
    let safe: String = collection_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let safe = match safe.trim() {
        "" | "." | ".." => "collection".to_string(),
        trimmed => trimmed.to_string(),
    };
    format!("{safe}-{count}-metadata.json")
}
