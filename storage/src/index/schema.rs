//! Span index schema
//!
//! Raw (untokenized) string fields so lookups match whole trace ids,
//! service names and span names exactly.

use spanlog_core::Span;
use tantivy::schema::{Field, Schema, Value, STORED, STRING};
use tantivy::TantivyDocument;

pub const TRACE_ID: &str = "trace_id";
pub const SERVICE_NAME: &str = "service_name";
pub const SPAN_NAME: &str = "span_name";

/// Schema and field handles for indexing spans
#[derive(Clone, Debug)]
pub struct SpanIndexSchema {
    schema: Schema,
    trace_id: Field,
    service_name: Field,
    span_name: Field,
}

impl SpanIndexSchema {
    pub fn new() -> Self {
        let mut builder = Schema::builder();
        let trace_id = builder.add_text_field(TRACE_ID, STRING | STORED);
        let service_name = builder.add_text_field(SERVICE_NAME, STRING | STORED);
        let span_name = builder.add_text_field(SPAN_NAME, STRING | STORED);
        Self {
            schema: builder.build(),
            trace_id,
            service_name,
            span_name,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn trace_id(&self) -> Field {
        self.trace_id
    }

    pub fn service_name(&self) -> Field {
        self.service_name
    }

    pub fn span_name(&self) -> Field {
        self.span_name
    }

    /// Index document for `span`; absent names are indexed as empty strings
    pub fn document(&self, span: &Span) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.trace_id, &span.trace_id);
        doc.add_text(self.service_name, span.service_name());
        doc.add_text(self.span_name, span.span_name());
        doc
    }

    /// First text value of `field` in `doc`
    pub fn text<'a>(doc: &'a TantivyDocument, field: Field) -> Option<&'a str> {
        doc.get_first(field).and_then(|v| v.as_str())
    }
}

impl Default for SpanIndexSchema {
    fn default() -> Self {
        Self::new()
    }
}
