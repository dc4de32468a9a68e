//! In-memory log producer
//!
//! Keeps every acknowledged record in a vector. Useful for embedding the
//! pipeline without a log service and for tests, which can inject failures
//! per topic and add send latency.

use async_trait::async_trait;
use parking_lot::Mutex;
use spanlog_core::{LogProducer, LogRecord, ProducerError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Failures {
    all: Option<ProducerError>,
    by_topic: HashMap<String, ProducerError>,
}

impl Failures {
    fn for_topic(&self, topic: &str) -> Option<ProducerError> {
        self.all
            .clone()
            .or_else(|| self.by_topic.get(topic).cloned())
    }
}

/// Producer that appends acknowledged records to memory
#[derive(Default)]
pub struct MemoryProducer {
    records: Mutex<Vec<LogRecord>>,
    failures: Mutex<Failures>,
    latency: Option<Duration>,
    attempts: AtomicU64,
}

impl MemoryProducer {
    /// Create an empty producer that acknowledges every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every send by `latency` before acknowledging
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Reject every record sent to `topic` with `error`
    pub fn fail_topic(&self, topic: impl Into<String>, error: ProducerError) {
        self.failures.lock().by_topic.insert(topic.into(), error);
    }

    /// Reject every record with `error`
    pub fn fail_all(&self, error: ProducerError) {
        self.failures.lock().all = Some(error);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        *self.failures.lock() = Failures::default();
    }

    /// Snapshot of acknowledged records, in acknowledgement order
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Acknowledged records for one topic
    pub fn records_for(&self, topic: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.topic() == topic)
            .cloned()
            .collect()
    }

    /// Number of acknowledged records
    pub fn sent_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Number of send attempts, acknowledged or not
    pub fn attempt_count(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LogProducer for MemoryProducer {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, record: LogRecord) -> Result<(), ProducerError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failures.lock().for_topic(record.topic());
        match failure {
            Some(e) => Err(e),
            None => {
                self.records.lock().push(record);
                Ok(())
            }
        }
    }

    async fn health(&self) -> bool {
        self.failures.lock().all.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn record(topic: &str) -> LogRecord {
        LogRecord::new(topic, "k", Bytes::from_static(b"v"))
    }

    #[tokio::test]
    async fn test_records_by_topic() {
        let producer = MemoryProducer::new();
        producer.send(record("a")).await.unwrap();
        producer.send(record("b")).await.unwrap();
        producer.send(record("a")).await.unwrap();

        assert_eq!(producer.sent_count(), 3);
        assert_eq!(producer.records_for("a").len(), 2);
        assert_eq!(producer.records_for("b").len(), 1);
    }

    #[tokio::test]
    async fn test_topic_failure_and_heal() {
        let producer = MemoryProducer::new();
        producer.fail_topic("a", ProducerError::Send("nope".into()));

        assert!(producer.send(record("a")).await.is_err());
        assert!(producer.send(record("b")).await.is_ok());
        assert!(producer.health().await);

        producer.heal();
        assert!(producer.send(record("a")).await.is_ok());
        assert_eq!(producer.attempt_count(), 3);
        assert_eq!(producer.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_fail_all_marks_unhealthy() {
        let producer = MemoryProducer::new();
        producer.fail_all(ProducerError::Connection("down".into()));
        assert!(!producer.health().await);
        assert!(producer.send(record("a")).await.is_err());
    }
}
