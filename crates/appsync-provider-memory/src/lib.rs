//! In-memory provider backend for GraphQL API reconciliation.
//!
//! This crate implements [`AppSyncProvider`] and [`IamProvider`] on top of
//! `dashmap` so the reconciler can run without a live service: in tests, and
//! for dry runs that only need the change log.
//!
//! # Example
//!
//! ```ignore
//! use appsync_provider::AppSyncProvider;
//! use appsync_provider_memory::InMemoryProvider;
//!
//! let provider = InMemoryProvider::new();
//! let api = provider.create_graphql_api(&settings).await?;
//! assert_eq!(provider.journal().count("create_graphql_api"), 1);
//! ```

mod iam;
mod journal;
mod provider;

pub use appsync_provider::{AppSyncProvider, IamProvider, ProviderError};
pub use iam::InMemoryIam;
pub use journal::{CallJournal, ProviderCall};
pub use provider::{InMemoryProvider, ProviderOptions};

/// Creates a shared in-memory provider with default options.
pub fn create_provider() -> std::sync::Arc<InMemoryProvider> {
    std::sync::Arc::new(InMemoryProvider::new())
}

/// Creates a shared in-memory identity service.
pub fn create_iam() -> std::sync::Arc<InMemoryIam> {
    std::sync::Arc::new(InMemoryIam::new())
}
