//! Store behavior against CouchDB responses served by a mock server.

mod common;

use std::sync::Arc;

use oidc_couch::prelude::*;
use oidc_docdb_http::{HttpDatabase, HttpDatabaseConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::init_tracing;

fn storage(server: &MockServer) -> CouchOidcStorage {
    init_tracing();
    let db = HttpDatabase::new(&HttpDatabaseConfig::new(server.uri()), "openiddict").unwrap();
    CouchOidcStorage::new(Arc::new(db), CouchStoreOptions::default()).unwrap()
}

fn application() -> Application {
    serde_json::from_value(json!({
        "_id": "app-1",
        "_rev": "1-a",
        "discriminator": "openiddict.application",
        "client_id": "c1"
    }))
    .unwrap()
}

async fn mount_stale_delete(server: &MockServer) {
    Mock::given(method("DELETE"))
        .and(path("/openiddict/app-1"))
        .and(query_param("rev", "1-a"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "conflict", "reason": "Document update conflict."})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_child_view(server: &MockServer, view: &str, child: &str, rev: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/openiddict/_design/openiddict/_view/{view}")))
        .and(query_param("key", "\"app-1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 1,
            "offset": 0,
            "rows": [{"id": child, "key": "app-1", "value": rev}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_retried_delete_of_deleted_application_still_cascades() {
    let server = MockServer::start().await;
    mount_stale_delete(&server).await;
    Mock::given(method("GET"))
        .and(path("/openiddict/app-1"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "not_found", "reason": "deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_child_view(&server, "authorization.application_id", "authz-1", "1-b").await;
    mount_child_view(&server, "token.application_id", "token-1", "1-c").await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_bulk_docs"))
        .and(body_json(json!({"docs": [
            {"_id": "authz-1", "_rev": "1-b", "_deleted": true},
            {"_id": "token-1", "_rev": "1-c", "_deleted": true}
        ]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"ok": true, "id": "authz-1", "rev": "2-b"},
            {"ok": true, "id": "token-1", "rev": "2-c"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    storage(&server)
        .applications()
        .delete(&application())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_conflicting_delete_of_live_application_is_concurrency() {
    let server = MockServer::start().await;
    mount_stale_delete(&server).await;
    Mock::given(method("GET"))
        .and(path("/openiddict/app-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "app-1",
            "_rev": "2-z",
            "discriminator": "openiddict.application",
            "client_id": "c1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_bulk_docs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = storage(&server)
        .applications()
        .delete(&application())
        .await
        .unwrap_err();
    assert!(err.is_concurrency());
}
