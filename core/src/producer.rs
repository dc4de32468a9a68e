//! LogProducer trait
//!
//! The [`LogProducer`] trait is the seam to the external partitioned log.
//! Implementations wrap an already-configured client (connection, retries,
//! timeouts and batching all belong to that client).

use crate::error::ProducerError;
use crate::record::LogRecord;
use async_trait::async_trait;

/// LogProducer trait - sends records to the log service
///
/// # Implementation Requirements
///
/// - Producers must be `Send + Sync`; one instance is shared by every
///   in-flight write
/// - `send` transmits exactly one record and resolves once the log service
///   acknowledged or rejected it. No local buffering or retry beyond what
///   the wrapped client does itself
/// - Shutdown should flush in-flight records and release the client
///
/// # Example
///
/// ```ignore
/// use spanlog_core::{LogProducer, LogRecord, ProducerError};
/// use async_trait::async_trait;
///
/// struct BrokerProducer {
///     client: broker::Client,
/// }
///
/// #[async_trait]
/// impl LogProducer for BrokerProducer {
///     fn name(&self) -> &'static str {
///         "broker"
///     }
///
///     async fn send(&self, record: LogRecord) -> Result<(), ProducerError> {
///         self.client
///             .produce(record.topic(), record.key(), record.value())
///             .await
///             .map_err(|e| ProducerError::Send(e.to_string()))
///     }
///
///     async fn health(&self) -> bool {
///         self.client.is_connected()
///     }
/// }
/// ```
#[async_trait]
pub trait LogProducer: Send + Sync {
    /// Returns the producer's name for identification and logging
    fn name(&self) -> &'static str;

    /// Send one record and wait for the acknowledgement
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The log service acknowledged the record
    /// * `Err(ProducerError)` - The record was rejected or never delivered
    async fn send(&self, record: LogRecord) -> Result<(), ProducerError>;

    /// Check if the log service is reachable and accepting records
    async fn health(&self) -> bool;

    /// Graceful shutdown
    ///
    /// The default implementation returns `Ok(())` for producers that
    /// don't need cleanup.
    async fn shutdown(&self) -> Result<(), ProducerError> {
        Ok(())
    }
}
