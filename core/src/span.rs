//! Span - the unit of ingestion
//!
//! Spans arrive already encoded: the payload is whatever wire encoding the
//! caller chose and is forwarded untouched. Only the trace id, local service
//! name and span name are inspected, for partitioning and metadata.

use bytes::Bytes;

/// A single timed operation within a distributed trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Trace identifier, used as the partition key
    pub trace_id: String,

    /// Name of the service that recorded the span
    pub local_service_name: Option<String>,

    /// Operation name (e.g. `GET /users`)
    pub name: Option<String>,

    /// Encoded span, forwarded verbatim
    pub payload: Bytes,
}

impl Span {
    /// Create a span with a trace id and payload; names are unset
    pub fn new(trace_id: impl Into<String>, payload: Bytes) -> Self {
        Self {
            trace_id: trace_id.into(),
            local_service_name: None,
            name: None,
            payload,
        }
    }

    /// Set the local service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.local_service_name = Some(service.into());
        self
    }

    /// Set the span name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Local service name, or `""` when absent
    #[inline]
    pub fn service_name(&self) -> &str {
        self.local_service_name.as_deref().unwrap_or("")
    }

    /// Span name, or `""` when absent
    #[inline]
    pub fn span_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
