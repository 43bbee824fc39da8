//! Application (OAuth client) entity.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::{DocumentMeta, EntityDocument};
use super::normalize_properties;
use crate::kind::EntityKind;

/// A registered client application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(flatten)]
    meta: DocumentMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    consent_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    display_names: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    permissions: IndexSet<String>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    post_logout_redirect_uris: IndexSet<String>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    redirect_uris: IndexSet<String>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    requirements: IndexSet<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    application_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

impl Application {
    /// Creates a blank application.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn set_client_id(&mut self, client_id: Option<String>) {
        self.client_id = client_id;
    }

    /// Client secret as stored (hashing is the caller's concern).
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn set_client_secret(&mut self, client_secret: Option<String>) {
        self.client_secret = client_secret;
    }

    pub fn consent_type(&self) -> Option<&str> {
        self.consent_type.as_deref()
    }

    pub fn set_consent_type(&mut self, consent_type: Option<String>) {
        self.consent_type = consent_type;
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }

    /// Localized display names keyed by culture (e.g. `fr-FR`).
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

    pub fn permissions(&self) -> &IndexSet<String> {
        &self.permissions
    }

    pub fn set_permissions<I, S>(&mut self, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
    }

    pub fn post_logout_redirect_uris(&self) -> &IndexSet<String> {
        &self.post_logout_redirect_uris
    }

    pub fn set_post_logout_redirect_uris<I, S>(&mut self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_logout_redirect_uris = uris.into_iter().map(Into::into).collect();
    }

    pub fn redirect_uris(&self) -> &IndexSet<String> {
        &self.redirect_uris
    }

    pub fn set_redirect_uris<I, S>(&mut self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redirect_uris = uris.into_iter().map(Into::into).collect();
    }

    pub fn requirements(&self) -> &IndexSet<String> {
        &self.requirements
    }

    pub fn set_requirements<I, S>(&mut self, requirements: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
    }

    /// Client type (`public`, `confidential`, ...).
    pub fn application_type(&self) -> Option<&str> {
        self.application_type.as_deref()
    }

    pub fn set_application_type(&mut self, application_type: Option<String>) {
        self.application_type = application_type;
    }

    /// Opaque extension properties, preserved verbatim; empty when none are stored.
    pub fn properties(&self) -> &Map<String, Value> {
        super::properties_or_empty(self.properties.as_ref())
    }

    /// Replaces the properties; an empty map clears them.
    pub fn set_properties(&mut self, properties: Map<String, Value>) {
        self.properties = normalize_properties(properties);
    }
}

impl EntityDocument for Application {
    const KIND: EntityKind = EntityKind::Application;

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

/// Entity types usable with the application store.
pub trait ApplicationEntity: EntityDocument {
    fn application(&self) -> &Application;
    fn application_mut(&mut self) -> &mut Application;
}

impl ApplicationEntity for Application {
    fn application(&self) -> &Application {
        self
    }

    fn application_mut(&mut self) -> &mut Application {
        self
    }
}
