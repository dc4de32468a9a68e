//! Convenience re-exports for embedding spanlog.
//!
//! ```rust
//! use spanlog_runtime::prelude::*;
//! ```

// Core types
pub use spanlog_core::{LogProducer, LogRecord, ProducerError, Span};

// Log writes
pub use spanlog_storage::{AggregateCall, MemoryProducer, ProducerCall, SpanConsumer};

// Metadata caches
pub use spanlog_storage::{ExpiringSpanNames, MetadataCache, ServiceSpanNames};

// Index store
pub use spanlog_storage::{
    IndexedStateStore, IndexedStateStoreBuilder, ProcessorContext, SpanIndexSchema,
    StandaloneContext, StateStore, StoreState,
};

// Configuration and errors
pub use spanlog_storage::{LogFormat, StorageConfig, StorageError};

// Zero-copy payload
pub use bytes::Bytes;
pub use std::sync::Arc;

// Runtime
pub use crate::{init_tracing, Storage, StorageBuilder};
