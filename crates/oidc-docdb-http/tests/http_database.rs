use assert_json_diff::assert_json_eq;
use oidc_docdb::{
    BuiltinReduce, DatabaseError, DesignDocument, DocumentDatabase, ErrorCategory, FindRequest,
    Selector, ViewDefinition, ViewQuery, ViewRef,
};
use oidc_docdb_http::{HttpDatabase, HttpDatabaseConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn database(server: &MockServer) -> HttpDatabase {
    HttpDatabase::new(&HttpDatabaseConfig::new(server.uri()), "openiddict").unwrap()
}

fn design() -> DesignDocument {
    DesignDocument::new("openiddict").with_view(
        ViewDefinition::new(
            "token",
            "function (doc) { if (doc.discriminator === 'openiddict.token') emit(doc._id, doc._rev); }",
            |_, _| {},
        )
        .with_reduce(BuiltinReduce::Count),
    )
}

#[tokio::test]
async fn test_get_existing_and_missing_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openiddict/app-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"_id": "app-1", "_rev": "1-a", "client_id": "c1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/openiddict/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "not_found", "reason": "missing"})),
        )
        .mount(&server)
        .await;

    let db = database(&server);
    let doc = db.get("app-1").await.unwrap().unwrap();
    assert_eq!(doc["client_id"], "c1");
    assert!(db.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_without_id_posts_to_database() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openiddict/"))
        .and(body_json(json!({"discriminator": "openiddict.scope", "name": "email"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"ok": true, "id": "generated", "rev": "1-x"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let written = database(&server)
        .create(&json!({"discriminator": "openiddict.scope", "name": "email"}))
        .await
        .unwrap();
    assert_eq!(written.id, "generated");
    assert_eq!(written.rev, "1-x");
}

#[tokio::test]
async fn test_put_conflict_is_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/openiddict/app-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            json!({"error": "conflict", "reason": "Document update conflict."}),
        ))
        .mount(&server)
        .await;

    let err = database(&server)
        .put("app-1", &json!({"_id": "app-1", "_rev": "1-stale"}))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.category(), ErrorCategory::Conflict);
}

#[tokio::test]
async fn test_delete_sends_revision() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/openiddict/tok-1"))
        .and(query_param("rev", "3-abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "id": "tok-1", "rev": "4-def"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let written = database(&server).delete("tok-1", "3-abc").await.unwrap();
    assert_eq!(written.rev, "4-def");
}

#[tokio::test]
async fn test_bulk_docs_reports_each_element() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_bulk_docs"))
        .and(body_json(json!({"docs": [
            {"_id": "a", "_rev": "1-a", "_deleted": true},
            {"_id": "b", "_rev": "1-b", "_deleted": true}
        ]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"ok": true, "id": "a", "rev": "2-a"},
            {"id": "b", "error": "conflict", "reason": "Document update conflict."}
        ])))
        .mount(&server)
        .await;

    let results = database(&server)
        .bulk_docs(&[
            json!({"_id": "a", "_rev": "1-a", "_deleted": true}),
            json!({"_id": "b", "_rev": "1-b", "_deleted": true}),
        ])
        .await
        .unwrap();
    assert!(results[0].is_ok());
    assert!(!results[1].is_ok());
}

#[tokio::test]
async fn test_view_query_with_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openiddict/_design/openiddict/_view/token.subject"))
        .and(query_param("key", "\"alice\""))
        .and(query_param("include_docs", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 2,
            "offset": 0,
            "rows": [{"id": "t1", "key": "alice", "value": "1-a", "doc": {"_id": "t1"}}]
        })))
        .mount(&server)
        .await;

    let result = database(&server)
        .query_view(
            &ViewRef::new("openiddict", "token.subject"),
            &ViewQuery::new().with_key("alice").include_docs(),
        )
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].id.as_deref(), Some("t1"));
    assert_json_eq!(result.rows[0].doc.clone().unwrap(), json!({"_id": "t1"}));
}

#[tokio::test]
async fn test_view_query_with_keys_uses_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_design/openiddict/_view/scope.name"))
        .and(body_json(json!({"keys": ["email", "profile"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .expect(1)
        .mount(&server)
        .await;

    let result = database(&server)
        .query_view(
            &ViewRef::new("openiddict", "scope.name"),
            &ViewQuery::new().with_keys(["email", "profile"]),
        )
        .await
        .unwrap();
    assert!(result.rows.is_empty());
}

#[tokio::test]
async fn test_missing_view_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openiddict/_design/openiddict/_view/token"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "not_found", "reason": "missing_named_view"})),
        )
        .mount(&server)
        .await;

    let err = database(&server)
        .query_view(&ViewRef::new("openiddict", "token"), &ViewQuery::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_find_sends_mango_selector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_find"))
        .and(body_json(json!({
            "selector": {"$and": [
                {"discriminator": {"$eq": "openiddict.token"}},
                {"subject": {"$eq": "alice"}}
            ]},
            "limit": 500000
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"docs": [{"_id": "t1"}, {"_id": "t2"}]})),
        )
        .mount(&server)
        .await;

    let docs = database(&server)
        .find(
            &FindRequest::new(
                Selector::eq("discriminator", "openiddict.token").and(Selector::eq("subject", "alice")),
            )
            .with_limit(500_000),
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
}

#[tokio::test]
async fn test_find_without_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openiddict/_find"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "no_usable_index",
            "reason": "No global index exists for this sort"
        })))
        .mount(&server)
        .await;

    let err = database(&server)
        .find(&FindRequest::new(Selector::eq("subject", "alice")))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NoUsableIndex { .. }));
}

#[tokio::test]
async fn test_design_document_installed_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openiddict/_design/openiddict"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not_found", "reason": "missing"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/openiddict/_design/openiddict"))
        .and(body_json(design().to_json()))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            json!({"ok": true, "id": "_design/openiddict", "rev": "1-d"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    database(&server).ensure_design_document(&design()).await.unwrap();
}

#[tokio::test]
async fn test_design_document_unchanged_is_not_rewritten() {
    let server = MockServer::start().await;
    let mut existing = design().to_json();
    existing["_rev"] = json!("4-d");

    Mock::given(method("GET"))
        .and(path("/openiddict/_design/openiddict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(existing))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/openiddict/_design/openiddict"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    database(&server).ensure_design_document(&design()).await.unwrap();
}

#[tokio::test]
async fn test_connect_creates_database_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/openiddict/"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "error": "file_exists",
            "reason": "The database could not be created, the file already exists."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpDatabaseConfig::new(server.uri())
        .with_credentials("admin", "secret")
        .with_create_database(true);
    let db = HttpDatabase::connect(&config, "openiddict").await.unwrap();
    assert_eq!(db.database(), "openiddict");
    assert_eq!(db.backend_name(), "couchdb");
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let db = HttpDatabase::new(&HttpDatabaseConfig::new("http://127.0.0.1:1/"), "openiddict").unwrap();
    let err = db.get("anything").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transport);
}
