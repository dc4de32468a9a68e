//! spanlog runtime - process wiring
//!
//! Assembles a [`SpanConsumer`] and an [`IndexedStateStore`] from
//! [`StorageConfig`] around a caller-supplied [`LogProducer`], and installs
//! the tracing subscriber.
//!
//! # Quick start
//!
//! ```ignore
//! use spanlog_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StorageConfig::from_env()?;
//!     spanlog_runtime::init_tracing(&config)?;
//!
//!     let storage = Storage::builder(Arc::new(MemoryProducer::new()))
//!         .config(config)
//!         .build()?;
//!     storage.accept(&spans).await?;
//!     storage.shutdown().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod prelude;

use spanlog_core::{LogProducer, Span};
use spanlog_storage::config::LogFormat;
use spanlog_storage::{
    IndexedStateStore, IndexedStateStoreBuilder, MetadataCache, Metrics, SpanConsumer,
    SpanIndexSchema, StateStore, StorageConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Store name used when none is given
pub const DEFAULT_STORE_NAME: &str = "span-index";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a subscriber is
/// already installed.
pub fn init_tracing(config: &StorageConfig) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
    }
    Ok(())
}

/// Builder for [`Storage`].
///
/// Without an explicit [`config`](Self::config) the configuration is loaded
/// from `SPANLOG_*` environment variables at build time.
pub struct StorageBuilder {
    producer: Arc<dyn LogProducer>,
    config: Option<StorageConfig>,
    cache: Option<Arc<dyn MetadataCache>>,
    store_name: String,
    metrics: bool,
}

impl StorageBuilder {
    fn new(producer: Arc<dyn LogProducer>) -> Self {
        Self {
            producer,
            config: None,
            cache: None,
            store_name: DEFAULT_STORE_NAME.to_string(),
            metrics: true,
        }
    }

    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a metadata cache with other consumers
    pub fn cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    /// Skip Prometheus metric registration.
    pub fn disable_metrics(mut self) -> Self {
        self.metrics = false;
        self
    }

    /// Validate the configuration, open the index and wire the consumer.
    pub fn build(self) -> anyhow::Result<Storage> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => StorageConfig::from_env()?,
        };

        if self.metrics {
            Metrics::init()?;
        }

        let schema = SpanIndexSchema::new();
        let store = IndexedStateStoreBuilder::from_config(self.store_name, &config)
            .with_schema(schema.schema().clone())
            .build()?;

        let mut consumer = SpanConsumer::new(
            Arc::clone(&self.producer),
            config.spans_topic.as_str(),
            config.span_services_topic.as_str(),
        );
        if let Some(cache) = self.cache {
            consumer = consumer.with_cache(cache);
        }

        info!(
            producer = self.producer.name(),
            spans_topic = %config.spans_topic,
            span_services_topic = %config.span_services_topic,
            store = store.name(),
            persistent = store.persistent(),
            "Storage ready"
        );

        Ok(Storage {
            config,
            producer: self.producer,
            consumer,
            store,
            schema,
        })
    }
}

/// A span consumer and span index wired from one configuration.
pub struct Storage {
    config: StorageConfig,
    producer: Arc<dyn LogProducer>,
    consumer: SpanConsumer,
    store: IndexedStateStore,
    schema: SpanIndexSchema,
}

impl Storage {
    pub fn builder(producer: Arc<dyn LogProducer>) -> StorageBuilder {
        StorageBuilder::new(producer)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn consumer(&self) -> &SpanConsumer {
        &self.consumer
    }

    pub fn store(&self) -> &IndexedStateStore {
        &self.store
    }

    pub fn schema(&self) -> &SpanIndexSchema {
        &self.schema
    }

    /// Write `spans` to the log and wait for every write.
    pub async fn accept(&self, spans: &[Span]) -> anyhow::Result<()> {
        self.consumer.accept_and_wait(spans).await?;
        Ok(())
    }

    /// Index `spans` as one committed batch.
    pub fn index(&self, spans: &[Span]) -> anyhow::Result<usize> {
        let documents = spans.iter().map(|s| self.schema.document(s)).collect();
        Ok(self.store.add_documents(documents)?)
    }

    /// Close the index and shut the producer down.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.store.close()?;
        self.producer.shutdown().await?;
        info!(store = self.store.name(), "Storage shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use spanlog_storage::{MemoryProducer, ServiceSpanNames, StoreState};

    fn in_memory() -> StorageConfig {
        StorageConfig {
            index_persistent: false,
            ..StorageConfig::default()
        }
    }

    fn span(trace_id: &str) -> Span {
        Span::new(trace_id, Bytes::from_static(b"encoded"))
            .with_service("svcA")
            .with_name("GET /a")
    }

    #[tokio::test]
    async fn test_accept_index_shutdown() {
        let producer = Arc::new(MemoryProducer::new());
        let storage = Storage::builder(producer.clone())
            .config(in_memory())
            .disable_metrics()
            .build()
            .unwrap();

        let spans = vec![span("t1"), span("t2")];
        storage.accept(&spans).await.unwrap();
        assert_eq!(storage.index(&spans).unwrap(), 2);

        assert_eq!(producer.records_for("zipkin-spans").len(), 2);
        assert_eq!(producer.records_for("zipkin-span-services").len(), 1);
        assert_eq!(storage.store().num_docs().unwrap(), 2);
        assert_eq!(storage.store().name(), DEFAULT_STORE_NAME);

        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = StorageConfig {
            span_services_topic: "zipkin-spans".to_string(),
            ..in_memory()
        };
        let result = Storage::builder(Arc::new(MemoryProducer::new()))
            .config(config)
            .disable_metrics()
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_shared_cache_and_store_name() {
        let cache: Arc<dyn MetadataCache> = Arc::new(ServiceSpanNames::new());
        cache.should_publish("svcA", "GET /a");

        let producer = Arc::new(MemoryProducer::new());
        let storage = Storage::builder(producer.clone())
            .config(in_memory())
            .cache(cache)
            .store_name("traces")
            .disable_metrics()
            .build()
            .unwrap();

        storage.accept(&[span("t1")]).await.unwrap();
        assert!(producer.records_for("zipkin-span-services").is_empty());
        assert_eq!(storage.store().name(), "traces");
        assert_eq!(storage.store().state(), StoreState::Constructed);
    }

    #[tokio::test]
    async fn test_persistent_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            index_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        let storage = Storage::builder(Arc::new(MemoryProducer::new()))
            .config(config)
            .build()
            .unwrap();

        assert!(storage.store().persistent());
        storage.index(&[span("t1")]).unwrap();
        assert!(Metrics::get().is_some());
        storage.shutdown().await.unwrap();
    }
}
