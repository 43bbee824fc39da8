//! Entity types.
//!
//! Each entity embeds a [`DocumentMeta`] envelope and serializes to the
//! snake_case document layout the views index. Setters only mutate the
//! in-memory value; persisting goes through the stores.

mod application;
mod authorization;
mod document;
mod scope;
mod token;

pub use application::{Application, ApplicationEntity};
pub use authorization::{Authorization, AuthorizationEntity};
pub use document::{DocumentMeta, EntityDocument};
pub use scope::{Scope, ScopeEntity};
pub use token::{Token, TokenEntity};

use std::sync::LazyLock;

use serde_json::{Map, Value};

static NO_PROPERTIES: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// Stored properties, or a shared empty bag when none are stored.
pub(crate) fn properties_or_empty(properties: Option<&Map<String, Value>>) -> &Map<String, Value> {
    properties.unwrap_or(&NO_PROPERTIES)
}

/// Empty property bags are stored as absent.
pub(crate) fn normalize_properties(properties: Map<String, Value>) -> Option<Map<String, Value>> {
    if properties.is_empty() {
        None
    } else {
        Some(properties)
    }
}

/// Empty identifiers are stored as absent.
pub(crate) fn normalize_id(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
