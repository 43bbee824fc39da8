//! Token entity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::document::{DocumentMeta, EntityDocument};
use super::{normalize_id, normalize_properties};
use crate::kind::EntityKind;

/// An issued token (access, refresh, authorization code, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(flatten)]
    meta: DocumentMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    application_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_id: Option<String>,

    #[serde(
        default,
        with = "crate::dates::option",
        skip_serializing_if = "Option::is_none"
    )]
    creation_date: Option<OffsetDateTime>,

    #[serde(
        default,
        with = "crate::dates::option",
        skip_serializing_if = "Option::is_none"
    )]
    expiration_date: Option<OffsetDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<String>,

    #[serde(
        default,
        with = "crate::dates::option",
        skip_serializing_if = "Option::is_none"
    )]
    redemption_date: Option<OffsetDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

impl Token {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    /// Sets the owning application; an empty ID detaches it.
    pub fn set_application_id(&mut self, application_id: Option<String>) {
        self.application_id = normalize_id(application_id);
    }

    pub fn authorization_id(&self) -> Option<&str> {
        self.authorization_id.as_deref()
    }

    /// Sets the parent authorization; an empty ID detaches it.
    pub fn set_authorization_id(&mut self, authorization_id: Option<String>) {
        self.authorization_id = normalize_id(authorization_id);
    }

    pub fn creation_date(&self) -> Option<OffsetDateTime> {
        self.creation_date
    }

    pub fn set_creation_date(&mut self, date: Option<OffsetDateTime>) {
        self.creation_date = date;
    }

    pub fn expiration_date(&self) -> Option<OffsetDateTime> {
        self.expiration_date
    }

    pub fn set_expiration_date(&mut self, date: Option<OffsetDateTime>) {
        self.expiration_date = date;
    }

    /// Serialized token payload, for reference tokens.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: Option<String>) {
        self.payload = payload;
    }

    pub fn redemption_date(&self) -> Option<OffsetDateTime> {
        self.redemption_date
    }

    pub fn set_redemption_date(&mut self, date: Option<OffsetDateTime>) {
        self.redemption_date = date;
    }

    /// Public handle of a reference token.
    pub fn reference_id(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    pub fn set_reference_id(&mut self, reference_id: Option<String>) {
        self.reference_id = reference_id;
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

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn set_token_type(&mut self, token_type: Option<String>) {
        self.token_type = token_type;
    }

    pub fn properties(&self) -> &Map<String, Value> {
        super::properties_or_empty(self.properties.as_ref())
    }

    /// Replaces the properties; an empty map clears them.
    pub fn set_properties(&mut self, properties: Map<String, Value>) {
        self.properties = normalize_properties(properties);
    }
}

impl EntityDocument for Token {
    const KIND: EntityKind = EntityKind::Token;

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

/// Entity types usable with the token store.
pub trait TokenEntity: EntityDocument {
    fn token(&self) -> &Token;
    fn token_mut(&mut self) -> &mut Token;
}

impl TokenEntity for Token {
    fn token(&self) -> &Token {
        self
    }

    fn token_mut(&mut self) -> &mut Token {
        self
    }
}
