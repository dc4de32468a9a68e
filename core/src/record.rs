//! Log write requests
//!
//! A [`LogRecord`] is the `(topic, key, value)` triple handed to a log
//! producer. The value is `Bytes`, so cloning a record for a retry only
//! bumps a refcount:
//!
//! ```text
//! encoded span (Bytes)
//!        │
//!        ▼
//! LogRecord { topic, key, value }
//!        │ clone()             ← refcount only
//!        ├──────────────┐
//!        ▼              ▼
//!   first attempt    retry
//! ```

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// An immutable record destined for one topic of the log service
#[derive(Clone, PartialEq, Eq)]
pub struct LogRecord {
    topic: Arc<str>,
    key: Arc<str>,
    value: Bytes,
}

impl LogRecord {
    /// Create a new record
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::Bytes;
    /// use spanlog_core::LogRecord;
    ///
    /// let record = LogRecord::new("zipkin-spans", "trace-1", Bytes::from_static(b"span"));
    /// assert_eq!(record.topic(), "zipkin-spans");
    /// assert_eq!(record.key(), "trace-1");
    /// ```
    pub fn new(topic: impl Into<Arc<str>>, key: impl Into<Arc<str>>, value: Bytes) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            value,
        }
    }

    /// Topic the record is written to
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition key
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Record value
    #[inline]
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Value as a string slice, if it is valid UTF-8
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("topic", &self.topic)
            .field("key", &self.key)
            .field("value_len", &self.value.len())
            .finish()
    }
}
