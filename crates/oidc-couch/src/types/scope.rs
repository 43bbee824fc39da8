//! Scope entity.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::{DocumentMeta, EntityDocument};
use super::normalize_properties;
use crate::kind::EntityKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(flatten)]
    meta: DocumentMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    descriptions: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    display_names: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    resources: IndexSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn descriptions(&self) -> &BTreeMap<String, String> {
        &self.descriptions
    }

    pub fn set_descriptions<I, K, V>(&mut self, descriptions: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.descriptions = descriptions
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }

    pub fn display_names(&self) -> &BTreeMap<String, String> {
        &self.display_names
    }

    pub fn set_display_names<I, K, V>(&mut self, names: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.display_names = names
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    /// Unique scope name (e.g. `openid`, `api:read`).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Audiences the scope grants access to.
    pub fn resources(&self) -> &IndexSet<String> {
        &self.resources
    }

    pub fn set_resources<I, S>(&mut self, resources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
    }

    pub fn properties(&self) -> &Map<String, Value> {
        super::properties_or_empty(self.properties.as_ref())
    }

    pub fn set_properties(&mut self, properties: Map<String, Value>) {
        self.properties = normalize_properties(properties);
    }
}

impl EntityDocument for Scope {
    const KIND: EntityKind = EntityKind::Scope;

    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn instantiate() -> Result<Self, String> {
        Ok(Self::default())
    }
}

/// Entity types usable with the scope store.
pub trait ScopeEntity: EntityDocument {
    fn scope(&self) -> &Scope;
    fn scope_mut(&mut self) -> &mut Scope;
}

impl ScopeEntity for Scope {
    fn scope(&self) -> &Scope {
        self
    }

    fn scope_mut(&mut self) -> &mut Scope {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_localized_fields() {
        let mut scope = Scope::new();
        scope.set_name(Some("api".into()));
        scope.set_descriptions([("en", "API access"), ("de", "API-Zugriff")]);
        scope.set_resources(["urn:api", "urn:api"]);

        assert_json_eq!(
            serde_json::to_value(&scope).unwrap(),
            json!({
                "discriminator": "",
                "name": "api",
                "descriptions": {"de": "API-Zugriff", "en": "API access"},
                "resources": ["urn:api"]
            })
        );
    }
}
