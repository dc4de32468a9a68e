//! Host runtime seam for state stores
//!
//! A stream-processing host owns the lifecycle of its stores: it calls
//! [`StateStore::init`] once with a [`ProcessorContext`], which the store
//! uses to register a restore callback under its name. The host later
//! replays changelog records through that callback after a crash.
//!
//! [`StandaloneContext`] is the context used when no host runtime is
//! present. It keeps the registrations so records can still be replayed
//! by hand.

use crate::error::{Result, StorageError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Receives one replayed changelog record as `(key, value)`
pub type RestoreCallback = Box<dyn Fn(&[u8], &[u8]) + Send + Sync>;

/// What a store may ask of the host runtime during `init`
pub trait ProcessorContext: Send + Sync {
    /// Register `callback` to receive restored records for `store_name`
    fn register(&self, store_name: &str, callback: RestoreCallback) -> Result<()>;
}

/// A store whose lifecycle is driven by a host runtime
pub trait StateStore: Send + Sync {
    /// Unique store name
    fn name(&self) -> &str;

    /// Attach the store to the host runtime
    fn init(&self, context: &dyn ProcessorContext) -> Result<()>;

    /// Make pending writes durable
    fn flush(&self) -> Result<()>;

    /// Release the store's resources
    fn close(&self) -> Result<()>;

    /// Whether contents outlive the process
    fn persistent(&self) -> bool;

    /// Whether the store still accepts writes
    fn is_open(&self) -> bool;
}

/// In-process context holding one restore callback per store name
#[derive(Default, Clone)]
pub struct StandaloneContext {
    callbacks: Arc<Mutex<HashMap<String, Arc<RestoreCallback>>>>,
}

impl StandaloneContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a store registered under `store_name`
    pub fn is_registered(&self, store_name: &str) -> bool {
        self.callbacks.lock().contains_key(store_name)
    }

    /// Names of every registered store
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<_> = self.callbacks.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Feed `records` to the callback registered for `store_name`
    ///
    /// Returns the number of records delivered.
    pub fn restore<'a, I>(&self, store_name: &str, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
    {
        let callback = self
            .callbacks
            .lock()
            .get(store_name)
            .cloned()
            .ok_or_else(|| StorageError::Registration {
                store: store_name.to_string(),
                message: "no restore callback registered".to_string(),
            })?;

        let mut delivered = 0;
        for (key, value) in records {
            (*callback)(key, value);
            delivered += 1;
        }
        debug!(store = store_name, delivered, "Restored records");
        Ok(delivered)
    }
}

impl ProcessorContext for StandaloneContext {
    fn register(&self, store_name: &str, callback: RestoreCallback) -> Result<()> {
        let mut callbacks = self.callbacks.lock();
        if callbacks.contains_key(store_name) {
            return Err(StorageError::Registration {
                store: store_name.to_string(),
                message: "store already registered".to_string(),
            });
        }
        callbacks.insert(store_name.to_string(), Arc::new(callback));
        Ok(())
    }
}
