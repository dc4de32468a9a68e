//! Indexed state store integration tests
//!
//! Exercises the on-disk store: batch commit round trips, survival across a
//! close and reopen, surfaced commit failures, and rejection of writes after
//! close.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use spanlog_storage::{
    IndexedStateStore, IndexedStateStoreBuilder, Span, SpanIndexSchema, StandaloneContext,
    StateStore, StorageConfig, StorageError, StoreState,
};
use tantivy::TantivyDocument;

fn spans(k: usize) -> Vec<Span> {
    (0..k)
        .map(|i| {
            Span::new(format!("trace-{i:03}"), Bytes::new())
                .with_service(format!("svc-{}", i % 3))
                .with_name(format!("GET /{i}"))
        })
        .collect()
}

fn field_values(schema: &SpanIndexSchema, docs: &[TantivyDocument]) -> Vec<(String, String, String)> {
    let mut values: Vec<_> = docs
        .iter()
        .map(|doc| {
            (
                SpanIndexSchema::text(doc, schema.trace_id()).unwrap().to_string(),
                SpanIndexSchema::text(doc, schema.service_name()).unwrap().to_string(),
                SpanIndexSchema::text(doc, schema.span_name()).unwrap().to_string(),
            )
        })
        .collect();
    values.sort();
    values
}

fn open(path: &std::path::Path, schema: &SpanIndexSchema) -> IndexedStateStore {
    IndexedStateStore::builder("span-index")
        .persistent()
        .with_index_directory(path)
        .with_schema(schema.schema().clone())
        .build()
        .unwrap()
}

#[test]
fn committed_batch_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let schema = SpanIndexSchema::new();
    let store = open(dir.path(), &schema);
    assert!(store.persistent());
    assert_eq!(store.directory(), Some(dir.path()));

    let input = spans(25);
    let docs: Vec<_> = input.iter().map(|s| schema.document(s)).collect();
    let expected = field_values(&schema, &docs);

    assert_eq!(store.add_documents(docs).unwrap(), 25);

    let indexed = store.documents().unwrap();
    assert_eq!(indexed.len(), 25);
    assert_eq!(field_values(&schema, &indexed), expected);
}

#[test]
fn committed_documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let schema = SpanIndexSchema::new();

    let store = open(dir.path(), &schema);
    let docs: Vec<_> = spans(10).iter().map(|s| schema.document(s)).collect();
    store.add_documents(docs).unwrap();
    store.close().unwrap();

    let reopened = open(dir.path(), &schema);
    assert_eq!(reopened.state(), StoreState::Constructed);
    assert_eq!(reopened.num_docs().unwrap(), 10);
}

#[test]
fn missing_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let schema = SpanIndexSchema::new();

    let store = open(&nested, &schema);
    assert!(nested.is_dir());
    assert!(store.is_open());
}

#[test]
fn close_then_write_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let schema = SpanIndexSchema::new();
    let store = open(dir.path(), &schema);
    store.add_documents(vec![schema.document(&spans(1)[0])]).unwrap();

    store.close().unwrap();
    assert!(!store.is_open());

    let err = store.add_documents(vec![schema.document(&spans(1)[0])]).unwrap_err();
    assert!(matches!(err, StorageError::StoreClosed { .. }));
    assert_eq!(store.num_docs().unwrap(), 1);

    store.close().unwrap();
}

#[test]
fn commit_failure_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let index_dir = dir.path().join("index");
    let schema = SpanIndexSchema::new();
    let store = open(&index_dir, &schema);

    // New segment and meta files can no longer be created.
    std::fs::remove_dir_all(&index_dir).unwrap();

    let docs: Vec<_> = spans(3).iter().map(|s| schema.document(s)).collect();
    let err = store.add_documents(docs).unwrap_err();

    assert!(matches!(err, StorageError::Index(_)), "got {err:?}");
    assert_eq!(store.state(), StoreState::Constructed);
}

#[test]
fn store_from_config_under_host_context() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        index_dir: dir.path().join("index"),
        ..StorageConfig::default()
    };
    let store = IndexedStateStoreBuilder::from_config("span-index", &config)
        .build()
        .unwrap();

    let context = StandaloneContext::new();
    store.init(&context).unwrap();
    assert_eq!(store.state(), StoreState::Operating);
    assert_eq!(context.registered(), vec!["span-index".to_string()]);

    // Replayed records are dropped, not indexed.
    let replay = vec![(b"trace-1".as_slice(), b"span".as_slice())];
    context.restore("span-index", replay).unwrap();
    assert_eq!(store.num_docs().unwrap(), 0);

    store.close().unwrap();
}
