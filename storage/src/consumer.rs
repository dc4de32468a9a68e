//! Span acceptance pipeline
//!
//! Turns a batch of spans into log writes:
//!
//! ```text
//! span ──► spans topic           key = trace id,     value = encoded span
//!    └──► span-services topic    key = service name, value = span name
//!         (only when the MetadataCache has not seen the pair)
//! ```
//!
//! Partitioning spans by trace id keeps every span of a trace on one
//! partition, so downstream consumers can rebuild traces from a single
//! partition. All writes of a batch are returned as one [`AggregateCall`].

use crate::dedup::{MetadataCache, ServiceSpanNames};
use crate::error::Result;
use crate::metrics::Metrics;
use crate::producer::{AggregateCall, LogProducer, ProducerCall};
use bytes::Bytes;
use spanlog_core::Span;
use std::sync::Arc;
use tracing::{debug, warn};

/// Accepts spans and fans them out to the spans and span-services topics
pub struct SpanConsumer {
    producer: Arc<dyn LogProducer>,
    spans_topic: Arc<str>,
    span_services_topic: Arc<str>,
    cache: Arc<dyn MetadataCache>,
}

impl SpanConsumer {
    /// Create a consumer with a fresh, unbounded metadata cache
    pub fn new(
        producer: Arc<dyn LogProducer>,
        spans_topic: impl Into<Arc<str>>,
        span_services_topic: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            producer,
            spans_topic: spans_topic.into(),
            span_services_topic: span_services_topic.into(),
            cache: Arc::new(ServiceSpanNames::new()),
        }
    }

    /// Use `cache` to decide metadata writes
    ///
    /// Consumers sharing one cache never publish the same pair twice.
    pub fn with_cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Topic receiving encoded spans
    pub fn spans_topic(&self) -> &str {
        &self.spans_topic
    }

    /// Topic receiving span names
    pub fn span_services_topic(&self) -> &str {
        &self.span_services_topic
    }

    /// The metadata cache in use
    pub fn cache(&self) -> &Arc<dyn MetadataCache> {
        &self.cache
    }

    /// Build the writes for `spans`
    ///
    /// The metadata cache is updated immediately, but nothing is sent until
    /// the returned aggregate is executed or enqueued. An aggregate that is
    /// dropped unexecuted therefore leaves its pairs marked as published.
    pub fn accept(&self, spans: &[Span]) -> AggregateCall {
        if spans.is_empty() {
            return AggregateCall::empty();
        }

        let mut calls = Vec::with_capacity(spans.len() * 2);
        let mut skipped = 0usize;

        for span in spans {
            if span.trace_id.is_empty() {
                warn!(
                    service = span.service_name(),
                    name = span.span_name(),
                    "Span without trace id written with empty key"
                );
            }

            calls.push(ProducerCall::new(
                Arc::clone(&self.producer),
                Arc::clone(&self.spans_topic),
                span.trace_id.as_str(),
                span.payload.clone(),
            ));

            let service = span.service_name();
            let name = span.span_name();
            if self.cache.should_publish(service, name) {
                calls.push(ProducerCall::new(
                    Arc::clone(&self.producer),
                    Arc::clone(&self.span_services_topic),
                    service,
                    Bytes::copy_from_slice(name.as_bytes()),
                ));
            } else {
                skipped += 1;
            }
        }

        debug!(
            spans = spans.len(),
            writes = calls.len(),
            metadata_skipped = skipped,
            "Spans accepted"
        );
        if let Some(m) = Metrics::get() {
            m.record_accepted(spans.len());
            m.record_metadata_skipped(skipped);
        }

        AggregateCall::new(calls)
    }

    /// Accept `spans` and wait until every write has completed
    pub async fn accept_and_wait(&self, spans: &[Span]) -> Result<()> {
        self.accept(spans).execute().await
    }
}
