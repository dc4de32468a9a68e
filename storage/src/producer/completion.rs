//! Blocking waits and exactly-once callbacks over the async write path

use crate::error::{Result, StorageError};
use spanlog_core::ProducerError;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

/// Drive `write` to completion from synchronous code
///
/// On a multi-thread runtime the current worker is handed off with
/// `block_in_place`. A current-thread runtime cannot be blocked, so the
/// write runs on a helper thread with its own runtime, as it does when no
/// runtime exists at all.
pub(crate) fn block_on<W>(topic: &str, write: W) -> Result<()>
where
    W: Future<Output = Result<()>> + Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(write))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| run_detached(topic, write))
                .join()
                .unwrap_or_else(|_| {
                    Err(StorageError::produce(
                        topic,
                        ProducerError::Send("blocking write panicked".into()),
                    ))
                })
        }),
        Err(_) => run_detached(topic, write),
    }
}

fn run_detached<W>(topic: &str, write: W) -> Result<()>
where
    W: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            warn!(topic, error = %e, "Failed to start runtime for blocking write");
            StorageError::produce(topic, ProducerError::NotReady)
        })?;
    runtime.block_on(write)
}

/// Callback that fires exactly once
///
/// If dropped before [`complete`](Self::complete) is called, for example
/// because the runtime shut down with the write still in flight, the
/// callback receives the `abandoned` error instead.
pub(crate) struct Completion<F>
where
    F: FnOnce(Result<()>),
{
    callback: Option<F>,
    abandoned: Option<StorageError>,
}

impl<F> Completion<F>
where
    F: FnOnce(Result<()>),
{
    pub(crate) fn new(callback: F, abandoned: StorageError) -> Self {
        Self {
            callback: Some(callback),
            abandoned: Some(abandoned),
        }
    }

    pub(crate) fn complete(mut self, result: Result<()>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<F> Drop for Completion<F>
where
    F: FnOnce(Result<()>),
{
    fn drop(&mut self) {
        if let (Some(callback), Some(error)) = (self.callback.take(), self.abandoned.take()) {
            warn!(error = %error, "Write abandoned before completion");
            callback(Err(error));
        }
    }
}

/// Error handed to callbacks whose write never finished
pub(crate) fn shutdown_error(topic: &str) -> StorageError {
    StorageError::produce(
        topic,
        ProducerError::Shutdown("runtime stopped before the write completed".into()),
    )
}
