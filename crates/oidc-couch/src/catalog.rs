//! View catalog: logical index names resolved to physical views.
//!
//! A [`ViewCatalog`] is an immutable snapshot built from [`ViewOptions`].
//! [`CatalogHandle`] holds the current snapshot behind an `ArcSwap`, so a
//! reconfiguration replaces the whole catalog at once and readers never see
//! a mix of old and new names. Stores take one snapshot per operation.

use std::sync::Arc;

use arc_swap::ArcSwap;
use oidc_docdb::ViewRef;
use tracing::info;

use crate::config::ViewOptions;
use crate::kind::EntityKind;

/// Logical index names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    ApplicationAll,
    ApplicationCount,
    ApplicationClientId,
    ApplicationRedirectUri,
    ApplicationPostLogoutRedirectUri,
    AuthorizationAll,
    AuthorizationCount,
    AuthorizationApplicationId,
    AuthorizationSubject,
    AuthorizationPrune,
    ScopeAll,
    ScopeCount,
    ScopeName,
    ScopeResource,
    TokenAll,
    TokenCount,
    TokenApplicationId,
    TokenAuthorizationId,
    TokenReferenceId,
    TokenSubject,
    TokenPrune,
}

impl ViewName {
    /// Every logical name.
    pub const ALL: [ViewName; 21] = [
        ViewName::ApplicationAll,
        ViewName::ApplicationCount,
        ViewName::ApplicationClientId,
        ViewName::ApplicationRedirectUri,
        ViewName::ApplicationPostLogoutRedirectUri,
        ViewName::AuthorizationAll,
        ViewName::AuthorizationCount,
        ViewName::AuthorizationApplicationId,
        ViewName::AuthorizationSubject,
        ViewName::AuthorizationPrune,
        ViewName::ScopeAll,
        ViewName::ScopeCount,
        ViewName::ScopeName,
        ViewName::ScopeResource,
        ViewName::TokenAll,
        ViewName::TokenCount,
        ViewName::TokenApplicationId,
        ViewName::TokenAuthorizationId,
        ViewName::TokenReferenceId,
        ViewName::TokenSubject,
        ViewName::TokenPrune,
    ];

    /// Entity kind whose documents the view indexes.
    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::ApplicationAll
            | Self::ApplicationCount
            | Self::ApplicationClientId
            | Self::ApplicationRedirectUri
            | Self::ApplicationPostLogoutRedirectUri => EntityKind::Application,
            Self::AuthorizationAll
            | Self::AuthorizationCount
            | Self::AuthorizationApplicationId
            | Self::AuthorizationSubject
            | Self::AuthorizationPrune => EntityKind::Authorization,
            Self::ScopeAll | Self::ScopeCount | Self::ScopeName | Self::ScopeResource => {
                EntityKind::Scope
            }
            Self::TokenAll
            | Self::TokenCount
            | Self::TokenApplicationId
            | Self::TokenAuthorizationId
            | Self::TokenReferenceId
            | Self::TokenSubject
            | Self::TokenPrune => EntityKind::Token,
        }
    }

    /// Configured physical name of this view.
    #[must_use]
    pub fn configured_name(self, options: &ViewOptions) -> &str {
        match self {
            Self::ApplicationAll => &options.application.all,
            Self::ApplicationCount => &options.application.count,
            Self::ApplicationClientId => &options.application.client_id,
            Self::ApplicationRedirectUri => &options.application.redirect_uri,
            Self::ApplicationPostLogoutRedirectUri => &options.application.post_logout_redirect_uri,
            Self::AuthorizationAll => &options.authorization.all,
            Self::AuthorizationCount => &options.authorization.count,
            Self::AuthorizationApplicationId => &options.authorization.application_id,
            Self::AuthorizationSubject => &options.authorization.subject,
            Self::AuthorizationPrune => &options.authorization.prune,
            Self::ScopeAll => &options.scope.all,
            Self::ScopeCount => &options.scope.count,
            Self::ScopeName => &options.scope.name,
            Self::ScopeResource => &options.scope.resource,
            Self::TokenAll => &options.token.all,
            Self::TokenCount => &options.token.count,
            Self::TokenApplicationId => &options.token.application_id,
            Self::TokenAuthorizationId => &options.token.authorization_id,
            Self::TokenReferenceId => &options.token.reference_id,
            Self::TokenSubject => &options.token.subject,
            Self::TokenPrune => &options.token.prune,
        }
    }
}

/// Immutable mapping from every [`ViewName`] to its physical view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCatalog {
    options: ViewOptions,
    views: [ViewRef; 21],
}

impl ViewCatalog {
    /// Builds a catalog from view options.
    #[must_use]
    pub fn from_options(options: &ViewOptions) -> Self {
        let views = ViewName::ALL.map(|name| {
            ViewRef::new(
                options.design_document.clone(),
                name.configured_name(options),
            )
        });
        Self {
            options: options.clone(),
            views,
        }
    }

    /// Physical view of a logical name.
    #[must_use]
    pub fn view(&self, name: ViewName) -> &ViewRef {
        &self.views[name as usize]
    }

    /// Options the catalog was built from.
    #[must_use]
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }
}

/// Shared, hot-swappable handle to the current [`ViewCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    inner: Arc<ArcSwap<ViewCatalog>>,
}

impl CatalogHandle {
    /// Creates a handle holding the catalog built from `options`.
    #[must_use]
    pub fn new(options: &ViewOptions) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ViewCatalog::from_options(options))),
        }
    }

    /// Rebuilds every view descriptor from `options` and swaps it in.
    pub fn apply_options(&self, options: &ViewOptions) {
        self.inner.store(Arc::new(ViewCatalog::from_options(options)));
        info!(design = %options.design_document, "View catalog reconfigured");
    }

    /// Current catalog. The snapshot stays valid even if the handle is
    /// reconfigured while it is in use.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ViewCatalog> {
        self.inner.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let catalog = ViewCatalog::from_options(&ViewOptions::default());
        assert_eq!(
            catalog.view(ViewName::TokenReferenceId).to_string(),
            "_design/openiddict/_view/token.reference_id"
        );
        assert_eq!(
            catalog.view(ViewName::ApplicationAll),
            catalog.view(ViewName::ApplicationCount)
        );
        assert_eq!(catalog.view(ViewName::ScopeResource).view, "scope.resources");
    }

    #[test]
    fn test_every_name_indexes_itself() {
        for (index, name) in ViewName::ALL.iter().enumerate() {
            assert_eq!(*name as usize, index);
        }
        assert_eq!(ViewName::TokenPrune.kind(), EntityKind::Token);
        assert_eq!(ViewName::ScopeName.kind(), EntityKind::Scope);
    }

    #[test]
    fn test_apply_options_swaps_whole_catalog() {
        let handle = CatalogHandle::new(&ViewOptions::default());
        let before = handle.snapshot();

        let mut options = ViewOptions::default();
        options.design_document = "identity".into();
        options.token.subject = "token.by_subject".into();
        handle.apply_options(&options);

        let after = handle.snapshot();
        assert_eq!(after.view(ViewName::TokenSubject).design, "identity");
        assert_eq!(after.view(ViewName::TokenSubject).view, "token.by_subject");
        assert_eq!(after.view(ViewName::ScopeName).design, "identity");

        // Earlier snapshots are unaffected
        assert_eq!(before.view(ViewName::TokenSubject).design, "openiddict");
    }
}
