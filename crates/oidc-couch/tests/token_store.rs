//! Token store lookups and pruning.

mod common;

use oidc_couch::prelude::*;
use oidc_docdb::DocumentDatabase;
use serde_json::json;
use time::OffsetDateTime;
use time::macros::datetime;

use common::{collect, storage};

fn token(subject: &str, application_id: &str, status: &str, token_type: &str) -> Token {
    let mut token = Token::new();
    token.set_subject(Some(subject.into()));
    token.set_application_id(Some(application_id.into()));
    token.set_status(Some(status.into()));
    token.set_token_type(Some(token_type.into()));
    token.set_creation_date(Some(datetime!(2024-01-01 10:00:00 UTC)));
    token
}

fn created_on(date: OffsetDateTime, status: &str) -> Token {
    let mut token = token("alice", "app-1", status, "access_token");
    token.set_creation_date(Some(date));
    token
}

#[tokio::test]
async fn test_round_trip_keeps_dates_and_payload() {
    let (db, storage) = storage().await;
    let store = storage.tokens();

    let mut created = token("alice", "app-1", "valid", "refresh_token");
    created.set_expiration_date(Some(datetime!(2024-01-02 10:00:00.5 UTC)));
    created.set_payload(Some("eyJhbGciOi...".into()));
    created.set_reference_id(Some("ref-1".into()));
    store.create(&mut created).await.unwrap();

    let found = store.find_by_id(created.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert_eq!(found.expiration_date(), Some(datetime!(2024-01-02 10:00:00.5 UTC)));
    assert!(found.redemption_date().is_none());

    let raw = db.get(created.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(raw["type"], json!("refresh_token"));
    assert!(raw.get("redemption_date").is_none());
    assert!(raw["creation_date"].as_str().unwrap().starts_with("2024-01-01T10:00:00"));
}

#[tokio::test]
async fn test_round_trip_keeps_nanosecond_dates() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    let mut created = token("alice", "app-1", "valid", "access_token");
    created.set_creation_date(Some(datetime!(2024-01-01 10:00:00.123456789 UTC)));
    created.set_expiration_date(Some(OffsetDateTime::now_utc()));
    created.set_redemption_date(Some(OffsetDateTime::now_utc()));
    store.create(&mut created).await.unwrap();

    let found = store.find_by_id(created.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert_eq!(found.creation_date(), Some(datetime!(2024-01-01 10:00:00.123456789 UTC)));
}

#[tokio::test]
async fn test_find_narrows_by_status_and_type() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    for (subject, client, status, token_type) in [
        ("alice", "app-1", "valid", "access_token"),
        ("alice", "app-1", "valid", "refresh_token"),
        ("alice", "app-1", "redeemed", "refresh_token"),
        ("alice", "app-2", "valid", "access_token"),
        ("bob", "app-1", "valid", "access_token"),
    ] {
        let mut entity = token(subject, client, status, token_type);
        store.create(&mut entity).await.unwrap();
    }

    assert_eq!(collect(store.find("alice", "app-1", None, None)).await.len(), 3);
    assert_eq!(collect(store.find("alice", "app-1", Some("valid"), None)).await.len(), 2);

    let refresh = collect(store.find("alice", "app-1", Some("valid"), Some("refresh_token"))).await;
    assert_eq!(refresh.len(), 1);
    assert_eq!(refresh[0].token_type(), Some("refresh_token"));

    assert!(collect(store.find("carol", "app-1", None, None)).await.is_empty());
}

#[tokio::test]
async fn test_lookups_by_foreign_keys_and_subject() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    let mut first = token("alice", "app-1", "valid", "access_token");
    first.set_authorization_id(Some("authz-1".into()));
    let mut second = token("alice", "app-2", "valid", "access_token");
    second.set_authorization_id(Some("authz-1".into()));
    let mut third = token("bob", "app-1", "valid", "access_token");
    for entity in [&mut first, &mut second, &mut third] {
        store.create(entity).await.unwrap();
    }

    assert_eq!(collect(store.find_by_application_id("app-1")).await.len(), 2);
    assert_eq!(collect(store.find_by_authorization_id("authz-1")).await.len(), 2);
    assert_eq!(collect(store.find_by_subject("bob")).await.len(), 1);
    assert!(collect(store.find_by_authorization_id("authz-2")).await.is_empty());
}

#[tokio::test]
async fn test_find_by_reference_id() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    let mut entity = token("alice", "app-1", "valid", "authorization_code");
    entity.set_reference_id(Some("opaque-reference".into()));
    store.create(&mut entity).await.unwrap();

    let found = store.find_by_reference_id("opaque-reference").await.unwrap().unwrap();
    assert_eq!(found.id(), entity.id());
    assert!(store.find_by_reference_id("other").await.unwrap().is_none());
}

#[tokio::test]
async fn test_arguments_are_validated() {
    let (db, storage) = storage().await;
    let store = storage.tokens();

    for result in [
        store.find("", "app-1", None, None).err(),
        store.find("alice", "", None, None).err(),
        store.find("alice", "app-1", Some(""), None).err(),
        store.find("alice", "app-1", None, Some("")).err(),
        store.find_by_application_id("").err(),
        store.find_by_authorization_id("").err(),
        store.find_by_subject("").err(),
    ] {
        assert!(result.is_some_and(|err| err.is_invalid_argument()));
    }
    assert!(store.find_by_reference_id("").await.unwrap_err().is_invalid_argument());
    assert_eq!(db.counters().view(), 0);
    assert_eq!(db.counters().find(), 0);
}

#[tokio::test]
async fn test_redeeming_token_updates_status() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    let mut entity = token("alice", "app-1", "valid", "authorization_code");
    store.create(&mut entity).await.unwrap();

    entity.set_status(Some("redeemed".into()));
    entity.set_redemption_date(Some(datetime!(2024-01-01 10:05:00 UTC)));
    store.update(&mut entity).await.unwrap();

    assert!(collect(store.find("alice", "app-1", Some("valid"), None)).await.is_empty());
    let redeemed = collect(store.find("alice", "app-1", Some("redeemed"), None)).await;
    assert_eq!(redeemed.len(), 1);
    assert_eq!(redeemed[0].redemption_date(), Some(datetime!(2024-01-01 10:05:00 UTC)));
}

#[tokio::test]
async fn test_prune_removes_old_unretained_tokens() {
    let (_db, storage) = storage().await;
    let store = storage.tokens();

    let mut old_redeemed = created_on(datetime!(2024-01-01 00:00:00 UTC), "redeemed");
    let mut old_revoked = created_on(datetime!(2024-01-05 00:00:00 UTC), "revoked");
    old_revoked.set_expiration_date(Some(datetime!(2024-01-06 00:00:00 UTC)));
    let mut old_valid = created_on(datetime!(2024-01-02 00:00:00 UTC), "valid");
    let mut old_inactive = created_on(datetime!(2024-01-03 00:00:00 UTC), "inactive");
    let mut recent_redeemed = created_on(datetime!(2024-05-01 00:00:00 UTC), "redeemed");

    for entity in [
        &mut old_redeemed,
        &mut old_revoked,
        &mut old_valid,
        &mut old_inactive,
        &mut recent_redeemed,
    ] {
        store.create(entity).await.unwrap();
    }

    assert_eq!(store.prune(datetime!(2024-03-01 00:00:00 UTC)).await.unwrap(), 2);
    assert!(store.find_by_id(old_redeemed.id().unwrap()).await.unwrap().is_none());
    assert!(store.find_by_id(old_revoked.id().unwrap()).await.unwrap().is_none());
    assert_eq!(store.count().await.unwrap(), 3);

    assert_eq!(store.prune(datetime!(2024-03-01 00:00:00 UTC)).await.unwrap(), 0);
}
