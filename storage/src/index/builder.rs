//! Builder for [`IndexedStateStore`]

use super::schema::SpanIndexSchema;
use super::IndexedStateStore;
use crate::config::{StorageConfig, DEFAULT_WRITER_MEMORY, MIN_WRITER_MEMORY};
use crate::error::{Result, StorageError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tantivy::schema::Schema;

/// Configures and opens an [`IndexedStateStore`]
///
/// Stores are in-memory unless [`persistent`](Self::persistent) is called.
/// Caching is not offered: every batch is committed straight to the index.
#[derive(Debug, Clone)]
pub struct IndexedStateStoreBuilder {
    name: String,
    persistent: bool,
    index_directory: Option<PathBuf>,
    schema: Option<Schema>,
    writer_memory: usize,
    logging_enabled: bool,
    log_config: HashMap<String, String>,
}

impl IndexedStateStoreBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persistent: false,
            index_directory: None,
            schema: None,
            writer_memory: DEFAULT_WRITER_MEMORY,
            logging_enabled: false,
            log_config: HashMap::new(),
        }
    }

    /// Builder seeded from the index settings of `config`
    pub fn from_config(name: impl Into<String>, config: &StorageConfig) -> Self {
        let builder = Self::new(name).with_writer_memory(config.index_writer_memory);
        if config.index_persistent {
            builder.persistent().with_index_directory(&config.index_dir)
        } else {
            builder.in_memory()
        }
    }

    /// Keep the index in an on-disk directory
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Keep the index in memory only
    pub fn in_memory(mut self) -> Self {
        self.persistent = false;
        self
    }

    /// Directory for a persistent index; created on build if missing
    pub fn with_index_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.index_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Index schema; defaults to [`SpanIndexSchema`]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Writer memory budget in bytes
    pub fn with_writer_memory(mut self, bytes: usize) -> Self {
        self.writer_memory = bytes;
        self
    }

    /// Record that the host should keep a changelog for this store
    pub fn with_logging_enabled(mut self, config: HashMap<String, String>) -> Self {
        self.logging_enabled = true;
        self.log_config = config;
        self
    }

    pub fn with_logging_disabled(mut self) -> Self {
        self.logging_enabled = false;
        self.log_config.clear();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn index_directory(&self) -> Option<&Path> {
        self.index_directory.as_deref()
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn log_config(&self) -> &HashMap<String, String> {
        &self.log_config
    }

    /// Open the index writer and perform the initial empty commit
    pub fn build(self) -> Result<IndexedStateStore> {
        if self.name.is_empty() {
            return Err(StorageError::Config("store name must not be empty".into()));
        }
        if self.writer_memory < MIN_WRITER_MEMORY {
            return Err(StorageError::Config(format!(
                "writer memory {} is below the minimum of {MIN_WRITER_MEMORY} bytes",
                self.writer_memory
            )));
        }
        if self.persistent && self.index_directory.is_none() {
            return Err(StorageError::Config(format!(
                "persistent store '{}' needs an index directory",
                self.name
            )));
        }

        let schema = self
            .schema
            .unwrap_or_else(|| SpanIndexSchema::new().schema().clone());
        let directory = if self.persistent {
            self.index_directory
        } else {
            None
        };

        IndexedStateStore::open(
            self.name,
            directory,
            schema,
            self.writer_memory,
            self.logging_enabled,
            self.log_config,
        )
    }
}
