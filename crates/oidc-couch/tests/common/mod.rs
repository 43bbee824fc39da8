#![allow(dead_code)]

use std::sync::{Arc, Once};

use futures_util::TryStreamExt;
use oidc_couch::{CouchOidcStorage, CouchStoreOptions, EntityStream, StoreResult};
use oidc_docdb_memory::MemoryDatabase;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Storage over a fresh in-memory database with the design document installed.
pub async fn storage_with(options: CouchStoreOptions) -> (Arc<MemoryDatabase>, CouchOidcStorage) {
    init_tracing();
    let db = Arc::new(MemoryDatabase::new());
    let storage = CouchOidcStorage::new(db.clone(), options).expect("valid options");
    storage.initialize().await.expect("design document installed");
    (db, storage)
}

pub async fn storage() -> (Arc<MemoryDatabase>, CouchOidcStorage) {
    storage_with(CouchStoreOptions::default()).await
}

pub async fn collect<T>(stream: StoreResult<EntityStream<'_, T>>) -> Vec<T> {
    stream
        .expect("valid arguments")
        .try_collect()
        .await
        .expect("stream completes")
}

pub fn properties(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            map
        }
    }
}

pub fn sample_properties() -> Map<String, Value> {
    properties(json!({
        "tenant": {"id": 42, "name": "acme"},
        "flags": [true, false, null],
        "ratio": 0.5
    }))
}
