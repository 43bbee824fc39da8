//! Authorization (consent grant) entity.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::document::{DocumentMeta, EntityDocument};
use super::{normalize_id, normalize_properties};
use crate::kind::EntityKind;

/// A grant linking a subject to an application for a set of scopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(flatten)]
    meta: DocumentMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    application_id: Option<String>,

    #[serde(
        default,
        with = "crate::dates::option",
        skip_serializing_if = "Option::is_none"
    )]
    creation_date: Option<OffsetDateTime>,

    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    scopes: IndexSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    authorization_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

impl Authorization {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ID of the owning application. Not enforced by the database.
    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Sets the owning application; an empty ID detaches it.
    pub fn set_application_id(&mut self, application_id: Option<String>) {
        self.application_id = normalize_id(application_id);
    }

    pub fn creation_date(&self) -> Option<OffsetDateTime> {
        self.creation_date
    }

    pub fn set_creation_date(&mut self, date: Option<OffsetDateTime>) {
        self.creation_date = date;
    }

    pub fn scopes(&self) -> &IndexSet<String> {
        &self.scopes
    }

    pub fn set_scopes<I, S>(&mut self, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn set_subject(&mut self, subject: Option<String>) {
        self.subject = subject;
    }

    /// Authorization type (`permanent`, `ad-hoc`, ...).
    pub fn authorization_type(&self) -> Option<&str> {
        self.authorization_type.as_deref()
    }

    pub fn set_authorization_type(&mut self, authorization_type: Option<String>) {
        self.authorization_type = authorization_type;
    }

    pub fn properties(&self) -> &Map<String, Value> {
        super::properties_or_empty(self.properties.as_ref())
    }

    /// Replaces the properties; an empty map clears them.
    pub fn set_properties(&mut self, properties: Map<String, Value>) {
        self.properties = normalize_properties(properties);
    }
}

impl EntityDocument for Authorization {
    const KIND: EntityKind = EntityKind::Authorization;

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

/// Entity types usable with the authorization store.
pub trait AuthorizationEntity: EntityDocument {
    fn authorization(&self) -> &Authorization;
    fn authorization_mut(&mut self) -> &mut Authorization;
}

impl AuthorizationEntity for Authorization {
    fn authorization(&self) -> &Authorization {
        self
    }

    fn authorization_mut(&mut self) -> &mut Authorization {
        self
    }
}
