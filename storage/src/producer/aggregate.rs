//! Aggregate completion over many producer calls
//!
//! All calls run concurrently. The aggregate succeeds only once every call
//! has succeeded; otherwise it fails with the first failure in submission
//! order after every call has finished. Writes that succeeded stay written
//! (at-least-once, no compensation).

use super::completion::{self, shutdown_error, Completion};
use super::ProducerCall;
use crate::error::{Result, StorageError};
use futures::future::join_all;
use tracing::warn;

/// A combined completion for a batch of writes
#[derive(Clone, Debug, Default)]
pub struct AggregateCall {
    calls: Vec<ProducerCall>,
}

impl AggregateCall {
    /// Combine `calls` into one completion
    pub fn new(calls: Vec<ProducerCall>) -> Self {
        Self { calls }
    }

    /// An aggregate with no writes; completes successfully at once
    pub fn empty() -> Self {
        Self::default()
    }

    /// Constituent calls, in submission order
    pub fn calls(&self) -> &[ProducerCall] {
        &self.calls
    }

    /// Number of constituent writes
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the aggregate issues no writes
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Run every write and wait for all of them
    pub async fn execute(&self) -> Result<()> {
        if self.calls.is_empty() {
            return Ok(());
        }

        let results = join_all(self.calls.iter().map(|call| call.execute())).await;
        let total = results.len();

        // Each failed call has already logged its own cause.
        let mut failures = results.into_iter().filter_map(|r| r.err());
        let Some(first) = failures.next() else {
            return Ok(());
        };
        let failed = 1 + failures.count();

        warn!(failed, total, first = %first, "Aggregate log write failed");
        Err(StorageError::Aggregate {
            failed,
            total,
            first: Box::new(first),
        })
    }

    /// Run every write, blocking the current thread until all finish
    pub fn execute_blocking(&self) -> Result<()> {
        let Some(first) = self.calls.first() else {
            return Ok(());
        };
        completion::block_on(first.record().topic(), self.execute())
    }

    fn abandoned(&self) -> StorageError {
        let total = self.calls.len();
        let topic = self.calls.first().map(|c| c.record().topic()).unwrap_or_default();
        StorageError::Aggregate {
            failed: total,
            total,
            first: Box::new(shutdown_error(topic)),
        }
    }

    /// Run every write in the background and report through `callback`
    ///
    /// The callback runs exactly once, with a shutdown failure if the
    /// runtime stops first. Without an ambient tokio runtime it runs
    /// immediately with a failure covering every write.
    pub fn enqueue<F>(self, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        if self.calls.is_empty() {
            callback(Ok(()));
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let completion = Completion::new(callback, self.abandoned());
                handle.spawn(async move {
                    let result = self.execute().await;
                    completion.complete(result);
                });
            }
            Err(_) => {
                let total = self.calls.len();
                let topic = self.calls[0].record().topic().to_string();
                warn!(total, "No async runtime available to send records");
                callback(Err(StorageError::Aggregate {
                    failed: total,
                    total,
                    first: Box::new(StorageError::produce(
                        topic,
                        spanlog_core::ProducerError::NotReady,
                    )),
                }));
            }
        }
    }
}

impl From<Vec<ProducerCall>> for AggregateCall {
    fn from(calls: Vec<ProducerCall>) -> Self {
        Self::new(calls)
    }
}
