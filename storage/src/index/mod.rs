//! Indexed state store
//!
//! A [`StateStore`] backed by a full-text index. Each call to
//! [`IndexedStateStore::add_documents`] appends a batch and commits it, so a
//! batch is durable once the call returns. A single writer is shared by all
//! callers; batches are serialized behind one lock and never interleave.
//!
//! ```text
//! build() ──► Constructed ──► Operating ──► Closed
//!   (writer open,     (init or first     (writer released,
//!    empty commit)     batch)             writes rejected)
//! ```
//!
//! # Recovery
//!
//! [`StateStore::init`] registers a restore callback that discards every
//! replayed record. The store never rebuilds itself from a changelog; only
//! what was committed to a persistent directory survives a restart.

pub mod builder;
pub mod schema;

pub use builder::IndexedStateStoreBuilder;
pub use schema::SpanIndexSchema;

use crate::error::{Result, StorageError};
use crate::metrics::Metrics;
use crate::state::{ProcessorContext, StateStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tantivy::collector::DocSetCollector;
use tantivy::directory::MmapDirectory;
use tantivy::query::AllQuery;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, TantivyError};
use tracing::{debug, error, info, warn};

/// Lifecycle of an [`IndexedStateStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Constructed,
    Operating,
    Closed,
}

struct Inner {
    writer: Option<IndexWriter>,
    state: StoreState,
}

/// State store writing document batches to a full-text index
pub struct IndexedStateStore {
    name: String,
    directory: Option<PathBuf>,
    index: Index,
    inner: Mutex<Inner>,
    logging_enabled: bool,
    log_config: HashMap<String, String>,
}

impl IndexedStateStore {
    pub fn builder(name: impl Into<String>) -> IndexedStateStoreBuilder {
        IndexedStateStoreBuilder::new(name)
    }

    pub(crate) fn open(
        name: String,
        directory: Option<PathBuf>,
        schema: Schema,
        writer_memory: usize,
        logging_enabled: bool,
        log_config: HashMap<String, String>,
    ) -> Result<Self> {
        let index = match &directory {
            Some(path) => {
                std::fs::create_dir_all(path)?;
                info!(store = %name, path = %path.display(), "Storing index on disk");
                let dir = MmapDirectory::open(path).map_err(TantivyError::from)?;
                Index::open_or_create(dir, schema)?
            }
            None => {
                info!(store = %name, "Storing index in memory");
                Index::create_in_ram(schema)
            }
        };

        let mut writer: IndexWriter = index.writer_with_num_threads(1, writer_memory)?;
        writer.commit()?;

        Ok(Self {
            name,
            directory,
            index,
            inner: Mutex::new(Inner {
                writer: Some(writer),
                state: StoreState::Constructed,
            }),
            logging_enabled,
            log_config,
        })
    }

    pub fn state(&self) -> StoreState {
        self.inner.lock().state
    }

    /// The underlying index, for searching
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// On-disk location, if persistent
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn log_config(&self) -> &HashMap<String, String> {
        &self.log_config
    }

    /// Append `documents` and commit them as one batch
    ///
    /// Returns the number of documents committed. If a document is rejected
    /// the batch is not committed and the error is returned; documents added
    /// before the fault stay pending in the writer and are committed with the
    /// next successful batch. Nothing is rolled back.
    pub fn add_documents(&self, documents: Vec<TantivyDocument>) -> Result<usize> {
        let mut inner = self.inner.lock();
        let Some(writer) = inner.writer.as_mut() else {
            return Err(StorageError::StoreClosed {
                store: self.name.clone(),
            });
        };

        let count = documents.len();
        if count == 0 {
            return Ok(0);
        }

        info!(store = %self.name, count, "Indexing documents");
        if let Err(e) = write_batch(writer, documents) {
            error!(store = %self.name, count, error = %e, "Failed to index documents");
            if let Some(m) = Metrics::get() {
                m.record_index_failure(&self.name);
            }
            return Err(e.into());
        }

        inner.state = StoreState::Operating;
        if let Some(m) = Metrics::get() {
            m.record_commit(&self.name, count);
        }
        info!(store = %self.name, count, "Documents indexed");
        Ok(count)
    }

    /// Fresh reader over the latest commit
    pub fn reader(&self) -> Result<IndexReader> {
        Ok(self.index.reader()?)
    }

    /// Number of committed documents
    pub fn num_docs(&self) -> Result<u64> {
        Ok(self.reader()?.searcher().num_docs())
    }

    /// Every committed document, in index order
    pub fn documents(&self) -> Result<Vec<TantivyDocument>> {
        let searcher = self.reader()?.searcher();
        let mut addresses: Vec<_> = searcher
            .search(&AllQuery, &DocSetCollector)?
            .into_iter()
            .collect();
        addresses.sort();

        let mut documents = Vec::with_capacity(addresses.len());
        for address in addresses {
            documents.push(searcher.doc::<TantivyDocument>(address)?);
        }
        Ok(documents)
    }
}

fn write_batch(writer: &mut IndexWriter, documents: Vec<TantivyDocument>) -> tantivy::Result<()> {
    for doc in documents {
        writer.add_document(doc)?;
    }
    writer.commit()?;
    Ok(())
}

impl StateStore for IndexedStateStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, context: &dyn ProcessorContext) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == StoreState::Closed {
            return Err(StorageError::StoreClosed {
                store: self.name.clone(),
            });
        }

        // Replayed records are dropped: the index is not rebuilt from a changelog.
        context.register(&self.name, Box::new(|_key, _value| {}))?;
        inner.state = StoreState::Operating;
        info!(
            store = %self.name,
            logging_enabled = self.logging_enabled,
            "State store registered, restored records are discarded"
        );
        Ok(())
    }

    /// Batches are committed by `add_documents`; nothing is buffered here.
    fn flush(&self) -> Result<()> {
        debug!(store = %self.name, "Flush requested");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some(writer) = inner.writer.take() else {
            warn!(store = %self.name, "State store already closed");
            return Ok(());
        };
        inner.state = StoreState::Closed;

        if let Err(e) = writer.wait_merging_threads() {
            error!(store = %self.name, error = %e, "Error closing index writer");
            return Err(e.into());
        }
        info!(store = %self.name, "State store closed");
        Ok(())
    }

    fn persistent(&self) -> bool {
        self.directory.is_some()
    }

    fn is_open(&self) -> bool {
        self.inner.lock().writer.is_some()
    }
}

impl std::fmt::Debug for IndexedStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedStateStore")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("state", &self.state())
            .finish()
    }
}
