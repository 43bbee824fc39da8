//! Store configuration.
//!
//! All options have defaults matching a stock deployment: the
//! `openiddict.*` discriminators, a design document named `openiddict` and
//! one view per logical index.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::kind::EntityKind;

/// Hard upper bound of the per-query row ceiling.
pub const MAX_QUERY_LIMIT: usize = 268_435_456;

/// Root configuration of the CouchDB OIDC stores.
///
/// # Example (TOML)
///
/// ```toml
/// database_name = "identity"
/// query_limit = 100000
///
/// [discriminators]
/// token = "identity.token"
///
/// [views]
/// design_document = "identity"
///
/// [views.token]
/// subject = "token.by_subject"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CouchStoreOptions {
    /// Database holding every entity kind.
    pub database_name: String,

    /// Per-kind discriminator values.
    pub discriminators: Discriminators,

    /// Maximum number of rows a single query may return.
    pub query_limit: usize,

    /// Tombstones submitted per bulk request.
    pub bulk_batch_size: usize,

    /// Documents removed per prune iteration.
    pub prune_batch_size: usize,

    /// Rows fetched per round trip when listing.
    pub list_page_size: usize,

    /// Design document and view names.
    pub views: ViewOptions,
}

impl Default for CouchStoreOptions {
    fn default() -> Self {
        Self {
            database_name: "openiddict".to_string(),
            discriminators: Discriminators::default(),
            query_limit: 500_000,
            bulk_batch_size: 10_000,
            prune_batch_size: 10_000,
            list_page_size: 1_000,
            views: ViewOptions::default(),
        }
    }
}

/// Discriminator value written to (and filtered on) every document of a kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Discriminators {
    pub application: String,
    pub authorization: String,
    pub scope: String,
    pub token: String,
}

impl Default for Discriminators {
    fn default() -> Self {
        Self {
            application: "openiddict.application".to_string(),
            authorization: "openiddict.authorization".to_string(),
            scope: "openiddict.scope".to_string(),
            token: "openiddict.token".to_string(),
        }
    }
}

impl Discriminators {
    /// Returns the discriminator of `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Application => &self.application,
            EntityKind::Authorization => &self.authorization,
            EntityKind::Scope => &self.scope,
            EntityKind::Token => &self.token,
        }
    }
}

/// Physical view names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Design document holding every view.
    pub design_document: String,
    pub application: ApplicationViews,
    pub authorization: AuthorizationViews,
    pub scope: ScopeViews,
    pub token: TokenViews,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            design_document: "openiddict".to_string(),
            application: ApplicationViews::default(),
            authorization: AuthorizationViews::default(),
            scope: ScopeViews::default(),
            token: TokenViews::default(),
        }
    }
}

/// Application view names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationViews {
    pub all: String,
    pub count: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
}

impl Default for ApplicationViews {
    fn default() -> Self {
        Self {
            all: "application".to_string(),
            count: "application".to_string(),
            client_id: "application.client_id".to_string(),
            redirect_uri: "application.redirect_uris".to_string(),
            post_logout_redirect_uri: "application.post_logout_redirect_uris".to_string(),
        }
    }
}

/// Authorization view names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationViews {
    pub all: String,
    pub count: String,
    pub application_id: String,
    pub subject: String,
    pub prune: String,
}

impl Default for AuthorizationViews {
    fn default() -> Self {
        Self {
            all: "authorization".to_string(),
            count: "authorization".to_string(),
            application_id: "authorization.application_id".to_string(),
            subject: "authorization.subject".to_string(),
            prune: "authorization.prune".to_string(),
        }
    }
}

/// Scope view names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeViews {
    pub all: String,
    pub count: String,
    pub name: String,
    pub resource: String,
}

impl Default for ScopeViews {
    fn default() -> Self {
        Self {
            all: "scope".to_string(),
            count: "scope".to_string(),
            name: "scope.name".to_string(),
            resource: "scope.resources".to_string(),
        }
    }
}

/// Token view names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenViews {
    pub all: String,
    pub count: String,
    pub application_id: String,
    pub authorization_id: String,
    pub reference_id: String,
    pub subject: String,
    pub prune: String,
}

impl Default for TokenViews {
    fn default() -> Self {
        Self {
            all: "token".to_string(),
            count: "token".to_string(),
            application_id: "token.application_id".to_string(),
            authorization_id: "token.authorization_id".to_string(),
            reference_id: "token.reference_id".to_string(),
            subject: "token.subject".to_string(),
            prune: "token.prune".to_string(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl CouchStoreOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed TOML and
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let options: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`CouchStoreOptions::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Sets the database name.
    #[must_use]
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the discriminator of one entity kind.
    #[must_use]
    pub fn with_discriminator(mut self, kind: EntityKind, value: impl Into<String>) -> Self {
        let value = value.into();
        match kind {
            EntityKind::Application => self.discriminators.application = value,
            EntityKind::Authorization => self.discriminators.authorization = value,
            EntityKind::Scope => self.discriminators.scope = value,
            EntityKind::Token => self.discriminators.token = value,
        }
        self
    }

    /// Sets the per-query row ceiling.
    #[must_use]
    pub fn with_query_limit(mut self, limit: usize) -> Self {
        self.query_limit = limit;
        self
    }

    /// Sets the bulk request size.
    #[must_use]
    pub fn with_bulk_batch_size(mut self, size: usize) -> Self {
        self.bulk_batch_size = size;
        self
    }

    /// Sets the prune batch size.
    #[must_use]
    pub fn with_prune_batch_size(mut self, size: usize) -> Self {
        self.prune_batch_size = size;
        self
    }

    /// Sets the listing page size.
    #[must_use]
    pub fn with_list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = size;
        self
    }

    /// Replaces the view names.
    #[must_use]
    pub fn with_views(mut self, views: ViewOptions) -> Self {
        self.views = views;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The database name or a discriminator is empty
    /// - Two kinds share a discriminator
    /// - `query_limit` is zero or above [`MAX_QUERY_LIMIT`]
    /// - A batch or page size is zero
    /// - A view name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "database_name cannot be empty".to_string(),
            ));
        }

        for kind in EntityKind::ALL {
            if self.discriminators.for_kind(kind).is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "discriminator for {kind} cannot be empty"
                )));
            }
        }
        for (i, a) in EntityKind::ALL.iter().enumerate() {
            for b in &EntityKind::ALL[i + 1..] {
                if self.discriminators.for_kind(*a) == self.discriminators.for_kind(*b) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{a} and {b} share the discriminator '{}'",
                        self.discriminators.for_kind(*a)
                    )));
                }
            }
        }

        if self.query_limit == 0 || self.query_limit > MAX_QUERY_LIMIT {
            return Err(ConfigError::InvalidValue(format!(
                "query_limit must be between 1 and {MAX_QUERY_LIMIT}, got {}",
                self.query_limit
            )));
        }

        for (name, value) in [
            ("bulk_batch_size", self.bulk_batch_size),
            ("prune_batch_size", self.prune_batch_size),
            ("list_page_size", self.list_page_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{name} must be > 0")));
            }
        }

        self.views.validate()
    }
}

impl ViewOptions {
    /// Validates that no name is empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first empty entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.design_document.is_empty() {
            return Err(ConfigError::InvalidValue(
                "views.design_document cannot be empty".to_string(),
            ));
        }

        let names = [
            ("application.all", &self.application.all),
            ("application.count", &self.application.count),
            ("application.client_id", &self.application.client_id),
            ("application.redirect_uri", &self.application.redirect_uri),
            (
                "application.post_logout_redirect_uri",
                &self.application.post_logout_redirect_uri,
            ),
            ("authorization.all", &self.authorization.all),
            ("authorization.count", &self.authorization.count),
            ("authorization.application_id", &self.authorization.application_id),
            ("authorization.subject", &self.authorization.subject),
            ("authorization.prune", &self.authorization.prune),
            ("scope.all", &self.scope.all),
            ("scope.count", &self.scope.count),
            ("scope.name", &self.scope.name),
            ("scope.resource", &self.scope.resource),
            ("token.all", &self.token.all),
            ("token.count", &self.token.count),
            ("token.application_id", &self.token.application_id),
            ("token.authorization_id", &self.token.authorization_id),
            ("token.reference_id", &self.token.reference_id),
            ("token.subject", &self.token.subject),
            ("token.prune", &self.token.prune),
        ];

        for (name, value) in names {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "views.{name} cannot be empty"
                )));
            }
        }

        Ok(())
    }
}
