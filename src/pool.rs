//! Bounded-concurrency execution of independent units.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Runs a sequence of units with at most `concurrency` of them in flight.
///
/// Admission is a sliding window: as soon as one unit finishes, the next
/// queued input is started. Outputs are yielded in completion order and there
/// is exactly one output per input. Units report failure through their output
/// type, so one failing unit never cancels the others.
#[derive(Clone, Copy, Debug)]
pub struct BoundedPool {
    concurrency: usize,
}

impl BoundedPool {
    /// Create a pool; a concurrency of 0 is clamped to 1
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Maximum number of units in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Drive every input through `worker` and collect all outputs.
    ///
    /// Resolves only once every input has produced its output.
    pub async fn run<I, T, W, Fut>(&self, inputs: I, worker: W) -> Vec<Fut::Output>
    where
        I: IntoIterator<Item = T>,
        W: FnMut(T) -> Fut,
        Fut: Future,
    {
        stream::iter(inputs)
            .map(worker)
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
