//! spanlog storage - span fan-out to a partitioned log
//!
//! Accepts batches of encoded spans and writes them to two log topics, and
//! hosts an indexed state store for stream processors that index spans.
//!
//! ```text
//! spans ──► SpanConsumer ──► AggregateCall ──► ProducerCall* ──► LogProducer
//!               │
//!               └── MetadataCache (dedups span-services writes)
//!
//! host runtime ──► IndexedStateStore ──► full-text index (disk or memory)
//! ```
//!
//! The log client itself is not part of this crate: callers supply any
//! [`LogProducer`] implementation.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod consumer;
pub mod dedup;
pub mod error;
pub mod index;
pub mod metrics;
pub mod producer;
pub mod state;

pub use config::{LogFormat, StorageConfig};
pub use consumer::SpanConsumer;
pub use dedup::{ExpiringSpanNames, MetadataCache, ServiceSpanNames};
pub use error::{Result, StorageError};
pub use index::{IndexedStateStore, IndexedStateStoreBuilder, SpanIndexSchema, StoreState};
pub use metrics::Metrics;
pub use producer::{AggregateCall, MemoryProducer, ProducerCall};
pub use spanlog_core::{LogProducer, LogRecord, ProducerError, Span};
pub use state::{ProcessorContext, RestoreCallback, StandaloneContext, StateStore};
