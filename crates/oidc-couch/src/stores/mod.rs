//! Store implementations over a [`DocumentDatabase`](oidc_docdb::DocumentDatabase).
//!
//! Every store is a thin layer over a shared document-store core holding
//! the database handle, the options snapshot and the view catalog handle.
//! Stores are cheap to clone and safe to share between tasks.

mod application;
mod authorization;
mod document;
mod scope;
mod token;

pub use application::CouchApplicationStore;
pub use authorization::CouchAuthorizationStore;
pub use scope::CouchScopeStore;
pub use token::CouchTokenStore;
