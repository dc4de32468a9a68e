//! Error types for log producers

use thiserror::Error;

/// Error type for log producer operations
///
/// This is the failure taxonomy a log client reports back for a single
/// record transmission. The storage layer wraps it with the topic the
/// record was headed for before surfacing it to callers.
///
/// # Example
///
/// ```
/// use spanlog_core::ProducerError;
///
/// fn send_to_broker() -> Result<(), ProducerError> {
///     Err(ProducerError::Connection("broker unreachable".to_string()))
/// }
///
/// match send_to_broker() {
///     Ok(_) => println!("Sent!"),
///     Err(ProducerError::Connection(msg)) => println!("Connection failed: {}", msg),
///     Err(e) => println!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProducerError {
    /// Send failed
    ///
    /// The log service rejected or failed to acknowledge the record.
    /// Examples: request timeout, record too large, not leader for partition.
    #[error("send failed: {0}")]
    Send(String),

    /// Connection error
    ///
    /// The client could not reach the log service.
    /// Examples: DNS lookup failed, connection refused, TLS handshake error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Not ready
    ///
    /// The producer (or the runtime it needs) is not available to accept
    /// records yet.
    #[error("producer not ready")]
    NotReady,

    /// Shutdown error
    ///
    /// Returned by sends racing a producer shutdown, or when flushing
    /// in-flight records on shutdown fails.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
