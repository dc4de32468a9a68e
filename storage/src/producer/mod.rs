//! Log producer adapter
//!
//! A [`ProducerCall`] is one pending write of one [`LogRecord`] through a
//! shared [`LogProducer`]. There is a single asynchronous write path,
//! [`ProducerCall::execute`]; the blocking and callback forms are thin
//! wrappers around it:
//!
//! ```text
//!                 ┌── execute().await ────────────► Result<()>
//! ProducerCall ───┼── execute_blocking() ─ wait ──► Result<()>
//!                 └── enqueue(cb) ─ spawn ─ cb(Result<()>)   (exactly once)
//! ```
//!
//! The adapter neither buffers nor retries. Failures are logged and
//! returned as [`StorageError::Produce`].

pub mod aggregate;
mod completion;
pub mod memory;

pub use aggregate::AggregateCall;
pub use memory::MemoryProducer;
pub use spanlog_core::{LogProducer, LogRecord, ProducerError};

use crate::error::{Result, StorageError};
use crate::metrics::try_record_write;
use completion::{shutdown_error, Completion};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error};

/// A single pending write to the log service
///
/// Cloning yields an independent call for the same immutable record, which
/// is how callers retry.
#[derive(Clone)]
pub struct ProducerCall {
    producer: Arc<dyn LogProducer>,
    record: LogRecord,
}

impl ProducerCall {
    /// Create a call writing `value` under `key` to `topic`
    pub fn new(
        producer: Arc<dyn LogProducer>,
        topic: impl Into<Arc<str>>,
        key: impl Into<Arc<str>>,
        value: Bytes,
    ) -> Self {
        Self::from_record(producer, LogRecord::new(topic, key, value))
    }

    /// Create a call for an existing record
    pub fn from_record(producer: Arc<dyn LogProducer>, record: LogRecord) -> Self {
        Self { producer, record }
    }

    /// The record this call writes
    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    /// Send the record and wait for the acknowledgement
    pub async fn execute(&self) -> Result<()> {
        let topic = self.record.topic();
        match self.producer.send(self.record.clone()).await {
            Ok(()) => {
                debug!(
                    producer = self.producer.name(),
                    topic,
                    key = self.record.key(),
                    "Record sent"
                );
                try_record_write(topic, true);
                Ok(())
            }
            Err(e) => {
                error!(
                    producer = self.producer.name(),
                    topic,
                    key = self.record.key(),
                    error = %e,
                    "Error sending record to log"
                );
                try_record_write(topic, false);
                Err(StorageError::produce(topic, e))
            }
        }
    }

    /// Send the record, blocking the current thread until acknowledged
    ///
    /// Works with or without an ambient tokio runtime. Inside a
    /// multi-thread runtime the worker is handed off while waiting; other
    /// contexts wait on a private runtime.
    pub fn execute_blocking(&self) -> Result<()> {
        completion::block_on(self.record.topic(), self.execute())
    }

    /// Send the record in the background and report through `callback`
    ///
    /// The callback runs exactly once, on a runtime worker thread. If the
    /// runtime shuts down first, it runs with [`ProducerError::Shutdown`].
    /// Without an ambient tokio runtime nothing can be sent, and the
    /// callback runs immediately on the calling thread with
    /// [`ProducerError::NotReady`].
    pub fn enqueue<F>(self, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let completion = Completion::new(callback, shutdown_error(self.record.topic()));
                handle.spawn(async move {
                    let result = self.execute().await;
                    completion.complete(result);
                });
            }
            Err(_) => {
                let topic = self.record.topic();
                error!(topic, "No async runtime available to send record");
                try_record_write(topic, false);
                callback(Err(StorageError::produce(topic, ProducerError::NotReady)));
            }
        }
    }
}

impl std::fmt::Debug for ProducerCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerCall")
            .field("producer", &self.producer.name())
            .field("record", &self.record)
            .finish()
    }
}
