//! Prometheus metrics for spanlog

use crate::error::{Result, StorageError};
use prometheus::{
    Counter, CounterVec, Encoder, TextEncoder, register_counter, register_counter_vec,
};
use parking_lot::Mutex;
use std::sync::OnceLock;

/// Global metrics instance
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Held while registering so concurrent `init` calls register once
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// All spanlog metrics
pub struct Metrics {
    // ─────────────────────────────────────────────────────────────────────────
    // Span acceptance
    // ─────────────────────────────────────────────────────────────────────────
    /// Spans handed to the consumer
    pub spans_accepted: Counter,

    /// Metadata writes skipped because the pair was already published
    pub metadata_skipped: Counter,

    // ─────────────────────────────────────────────────────────────────────────
    // Log writes
    // ─────────────────────────────────────────────────────────────────────────
    /// Records acknowledged by the log service (by topic)
    pub records_sent: CounterVec,

    /// Records that failed (by topic)
    pub records_failed: CounterVec,

    // ─────────────────────────────────────────────────────────────────────────
    // Index
    // ─────────────────────────────────────────────────────────────────────────
    /// Documents committed to the index (by store)
    pub documents_indexed: CounterVec,

    /// Index commits (by store)
    pub index_commits: CounterVec,

    /// Failed document batches (by store)
    pub index_failures: CounterVec,
}

impl Metrics {
    /// Initialize metrics (call once at startup)
    ///
    /// Returns error if metric registration fails.
    pub fn init() -> Result<&'static Metrics> {
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let _registering = INIT_LOCK.lock();
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let metrics = Metrics {
            spans_accepted: register_counter!(
                "spanlog_spans_accepted_total",
                "Total spans accepted for writing"
            )
            .map_err(|e| StorageError::Metrics(format!("spans_accepted: {e}")))?,

            metadata_skipped: register_counter!(
                "spanlog_metadata_skipped_total",
                "Metadata writes skipped for already published span names"
            )
            .map_err(|e| StorageError::Metrics(format!("metadata_skipped: {e}")))?,

            records_sent: register_counter_vec!(
                "spanlog_records_sent_total",
                "Records acknowledged by the log service",
                &["topic"]
            )
            .map_err(|e| StorageError::Metrics(format!("records_sent: {e}")))?,

            records_failed: register_counter_vec!(
                "spanlog_records_failed_total",
                "Records the log service failed to acknowledge",
                &["topic"]
            )
            .map_err(|e| StorageError::Metrics(format!("records_failed: {e}")))?,

            documents_indexed: register_counter_vec!(
                "spanlog_documents_indexed_total",
                "Documents committed to the index",
                &["store"]
            )
            .map_err(|e| StorageError::Metrics(format!("documents_indexed: {e}")))?,

            index_commits: register_counter_vec!(
                "spanlog_index_commits_total",
                "Index commits performed",
                &["store"]
            )
            .map_err(|e| StorageError::Metrics(format!("index_commits: {e}")))?,

            index_failures: register_counter_vec!(
                "spanlog_index_failures_total",
                "Document batches that failed to index",
                &["store"]
            )
            .map_err(|e| StorageError::Metrics(format!("index_failures: {e}")))?,
        };

        Ok(METRICS.get_or_init(|| metrics))
    }

    /// Get metrics if initialized
    pub fn get() -> Option<&'static Metrics> {
        METRICS.get()
    }

    /// Record spans accepted
    pub fn record_accepted(&self, count: usize) {
        self.spans_accepted.inc_by(count as f64);
    }

    /// Record metadata writes skipped
    pub fn record_metadata_skipped(&self, count: usize) {
        if count > 0 {
            self.metadata_skipped.inc_by(count as f64);
        }
    }

    /// Record the outcome of a single log write
    pub fn record_write(&self, topic: &str, success: bool) {
        if success {
            self.records_sent.with_label_values(&[topic]).inc();
        } else {
            self.records_failed.with_label_values(&[topic]).inc();
        }
    }

    /// Record a committed document batch
    pub fn record_commit(&self, store: &str, documents: usize) {
        self.index_commits.with_label_values(&[store]).inc();
        self.documents_indexed
            .with_label_values(&[store])
            .inc_by(documents as f64);
    }

    /// Record a failed document batch
    pub fn record_index_failure(&self, store: &str) {
        self.index_failures.with_label_values(&[store]).inc();
    }
}

/// Gather all metrics and encode as Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        String::new()
    }
}

/// Record a log write outcome if metrics are initialized
pub fn try_record_write(topic: &str, success: bool) {
    if let Some(m) = Metrics::get() {
        m.record_write(topic, success);
    }
}
