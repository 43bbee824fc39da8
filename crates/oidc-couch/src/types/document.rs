//! Shared document envelope and the entity traits stores are generic over.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::EntityKind;

/// `_id`, `_rev` and discriminator carried by every stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document ID, assigned on create.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Current revision, replaced on every successful write.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Entity kind tag; stores overwrite it with the configured value.
    #[serde(default)]
    pub discriminator: String,
}

/// A document type the stores can persist.
///
/// Custom entity types usually embed one of the built-in entities with
/// `#[serde(flatten)]` and forward [`EntityDocument::meta`] to it.
pub trait EntityDocument: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind whose discriminator tags this type.
    const KIND: EntityKind;

    /// Document envelope.
    fn meta(&self) -> &DocumentMeta;

    /// Mutable document envelope.
    fn meta_mut(&mut self) -> &mut DocumentMeta;

    /// Creates a blank entity.
    ///
    /// # Errors
    ///
    /// Returns a description of why the type cannot be constructed.
    fn instantiate() -> Result<Self, String>;

    /// Document ID, if the entity was persisted.
    fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }

    /// Revision the entity was read or written at.
    fn revision(&self) -> Option<&str> {
        self.meta().rev.as_deref()
    }
}
