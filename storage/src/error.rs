//! Error types for spanlog storage

use thiserror::Error;

pub use spanlog_core::ProducerError;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Main error type for spanlog storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single log write failed
    #[error("IO error writing to topic '{topic}': {source}")]
    Produce {
        topic: String,
        #[source]
        source: ProducerError,
    },

    /// One or more writes of an aggregate failed
    ///
    /// `first` is the earliest failed write in submission order. Writes that
    /// succeeded are not rolled back.
    #[error("{failed} of {total} log writes failed, first: {first}")]
    Aggregate {
        failed: usize,
        total: usize,
        #[source]
        first: Box<StorageError>,
    },

    /// Full-text index error
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// Operation on a closed store
    #[error("state store '{store}' is closed")]
    StoreClosed { store: String },

    /// Registering with the host processing runtime failed
    #[error("failed to register state store '{store}': {message}")]
    Registration { store: String, message: String },

    /// Metrics error
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl StorageError {
    /// Wrap a producer failure with the topic it was headed for
    pub fn produce(topic: impl Into<String>, source: ProducerError) -> Self {
        StorageError::Produce {
            topic: topic.into(),
            source,
        }
    }

    /// The underlying producer error, looking through aggregates
    pub fn producer_error(&self) -> Option<&ProducerError> {
        match self {
            StorageError::Produce { source, .. } => Some(source),
            StorageError::Aggregate { first, .. } => first.producer_error(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produce_error_display() {
        let err = StorageError::produce("zipkin-spans", ProducerError::Send("timeout".into()));
        assert_eq!(
            err.to_string(),
            "IO error writing to topic 'zipkin-spans': send failed: timeout"
        );
    }

    #[test]
    fn test_aggregate_exposes_first_cause() {
        let first = StorageError::produce("meta", ProducerError::NotReady);
        let err = StorageError::Aggregate {
            failed: 2,
            total: 5,
            first: Box::new(first),
        };
        assert_eq!(err.producer_error(), Some(&ProducerError::NotReady));
        assert!(err.to_string().starts_with("2 of 5 log writes failed"));
    }

    #[test]
    fn test_store_closed_display() {
        let err = StorageError::StoreClosed {
            store: "span-index".into(),
        };
        assert_eq!(err.to_string(), "state store 'span-index' is closed");
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
