//! Design document holding every view the stores query.
//!
//! Each view exists twice: as JavaScript for a CouchDB server and as a
//! native closure for backends that evaluate views in process. Both emit
//! the same rows.

use oidc_docdb::{BuiltinReduce, DesignDocument, ViewDefinition};
use serde_json::Value;

use crate::config::{Discriminators, ViewOptions};

/// Statuses excluded from the prune views.
const RETAINED_STATUSES: [&str; 2] = ["inactive", "valid"];

/// Builds the design document for the configured view names.
pub fn build_design_document(views: &ViewOptions, discriminators: &Discriminators) -> DesignDocument {
    let application = &discriminators.application;
    let authorization = &discriminators.authorization;
    let scope = &discriminators.scope;
    let token = &discriminators.token;

    DesignDocument::new(views.design_document.clone())
        // Applications
        .with_view(all_view(&views.application.all, application))
        .with_view(all_view(&views.application.count, application))
        .with_view(scalar_view(&views.application.client_id, application, "client_id"))
        .with_view(array_view(&views.application.redirect_uri, application, "redirect_uris"))
        .with_view(array_view(
            &views.application.post_logout_redirect_uri,
            application,
            "post_logout_redirect_uris",
        ))
        // Authorizations
        .with_view(all_view(&views.authorization.all, authorization))
        .with_view(all_view(&views.authorization.count, authorization))
        .with_view(scalar_view(
            &views.authorization.application_id,
            authorization,
            "application_id",
        ))
        .with_view(scalar_view(&views.authorization.subject, authorization, "subject"))
        .with_view(prune_view(&views.authorization.prune, authorization))
        // Scopes
        .with_view(all_view(&views.scope.all, scope))
        .with_view(all_view(&views.scope.count, scope))
        .with_view(scalar_view(&views.scope.name, scope, "name"))
        .with_view(array_view(&views.scope.resource, scope, "resources"))
        // Tokens
        .with_view(all_view(&views.token.all, token))
        .with_view(all_view(&views.token.count, token))
        .with_view(scalar_view(&views.token.application_id, token, "application_id"))
        .with_view(scalar_view(&views.token.authorization_id, token, "authorization_id"))
        .with_view(scalar_view(&views.token.reference_id, token, "reference_id"))
        .with_view(scalar_view(&views.token.subject, token, "subject"))
        .with_view(prune_view(&views.token.prune, token))
}

// ===== View builders =====

/// `_id -> _rev` with a `_count` reduce.
fn all_view(name: &str, discriminator: &str) -> ViewDefinition {
    let source = format!(
        "function (doc) {{ if (doc.discriminator === {d}) emit(doc._id, doc._rev); }}",
        d = js_string(discriminator)
    );
    let discriminator = discriminator.to_owned();
    ViewDefinition::new(name, source, move |doc, out| {
        if is_kind(doc, &discriminator) {
            out.emit(field(doc, "_id"), field(doc, "_rev"));
        }
    })
    .with_reduce(BuiltinReduce::Count)
}

/// Non-empty string field `-> _rev`.
fn scalar_view(name: &str, discriminator: &str, field_name: &'static str) -> ViewDefinition {
    let source = format!(
        "function (doc) {{ if (doc.discriminator === {d} && doc.{f}) emit(doc.{f}, doc._rev); }}",
        d = js_string(discriminator),
        f = field_name
    );
    let discriminator = discriminator.to_owned();
    ViewDefinition::new(name, source, move |doc, out| {
        if !is_kind(doc, &discriminator) {
            return;
        }
        if let Some(value) = doc.get(field_name).and_then(Value::as_str)
            && !value.is_empty()
        {
            out.emit(value, field(doc, "_rev"));
        }
    })
}

/// One row per element of an array field.
fn array_view(name: &str, discriminator: &str, field_name: &'static str) -> ViewDefinition {
    let source = format!(
        "function (doc) {{ if (doc.discriminator === {d} && Array.isArray(doc.{f})) \
         doc.{f}.forEach(function (item) {{ emit(item, doc._rev); }}); }}",
        d = js_string(discriminator),
        f = field_name
    );
    let discriminator = discriminator.to_owned();
    ViewDefinition::new(name, source, move |doc, out| {
        if !is_kind(doc, &discriminator) {
            return;
        }
        if let Some(items) = doc.get(field_name).and_then(Value::as_array) {
            for item in items {
                out.emit(item.clone(), field(doc, "_rev"));
            }
        }
    })
}

/// `[creation_date, expiration_date] -> _rev` for prunable documents.
fn prune_view(name: &str, discriminator: &str) -> ViewDefinition {
    let source = format!(
        "function (doc) {{ if (doc.discriminator === {d} && doc.creation_date \
         && doc.status !== {inactive} && doc.status !== {valid}) \
         emit([doc.creation_date, doc.expiration_date || null], doc._rev); }}",
        d = js_string(discriminator),
        inactive = js_string(RETAINED_STATUSES[0]),
        valid = js_string(RETAINED_STATUSES[1]),
    );
    let discriminator = discriminator.to_owned();
    ViewDefinition::new(name, source, move |doc, out| {
        if !is_kind(doc, &discriminator) {
            return;
        }
        let Some(created) = doc.get("creation_date").and_then(Value::as_str) else {
            return;
        };
        let status = doc.get("status").and_then(Value::as_str);
        if status.is_some_and(|status| RETAINED_STATUSES.contains(&status)) {
            return;
        }
        let expires = doc
            .get("expiration_date")
            .filter(|value| value.is_string())
            .cloned()
            .unwrap_or(Value::Null);
        out.emit(
            Value::Array(vec![Value::String(created.to_owned()), expires]),
            field(doc, "_rev"),
        );
    })
}

// ===== Helpers =====

fn is_kind(doc: &Value, discriminator: &str) -> bool {
    doc.get("discriminator").and_then(Value::as_str) == Some(discriminator)
}

fn field(doc: &Value, name: &str) -> Value {
    doc.get(name).cloned().unwrap_or(Value::Null)
}

/// JSON string literal, which is also a valid JavaScript literal.
fn js_string(value: &str) -> String {
    Value::String(value.to_owned()).to_string()
}
