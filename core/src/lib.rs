//! spanlog-core - Core types for spanlog
//!
//! This crate provides the types shared between the spanlog storage crate
//! and log-client integrations:
//!
//! - [`Span`] - an already-encoded span as received from collectors
//! - [`LogRecord`] - the `(topic, key, value)` write request
//! - [`LogProducer`] trait - async interface to the partitioned log
//! - [`ProducerError`] - error type for producer operations
//!
//! # Why this crate exists
//!
//! Log-client integrations need to implement `LogProducer` and build
//! `LogRecord`s. Keeping them here lets those crates avoid depending on
//! `spanlog-storage` (and its index dependencies):
//!
//! ```text
//! spanlog-core ◄── spanlog-storage ◄── spanlog-runtime
//!     ▲
//!     └────────── broker-producer (external)
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod error;
mod producer;
/// Log write requests
pub mod record;
/// Span type
pub mod span;

pub use error::ProducerError;
pub use producer::LogProducer;
pub use record::LogRecord;
pub use span::Span;
