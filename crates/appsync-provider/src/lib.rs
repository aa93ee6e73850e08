//! # appsync-provider
//!
//! Provider abstraction layer for GraphQL API reconciliation.
//!
//! This crate defines the traits and types that every service backend must
//! implement. It contains no real service binding; the in-memory backend lives
//! in `appsync-provider-memory`.
//!
//! ## Overview
//!
//! - [`AppSyncProvider`]: CRUD and paginated listings for the API container,
//!   data sources, resolvers, functions and API keys, plus asynchronous
//!   schema creation.
//! - [`IamProvider`]: role and inline policy management for the synthesized
//!   service role.
//! - [`TemplateSource`]: resolves fields that hold either literal text or a
//!   path to a file.
//!
//! ## Example
//!
//! ```ignore
//! use appsync_provider::{AppSyncProvider, Page, ProviderError, RemoteDataSource};
//!
//! async fn first_page(
//!     provider: &dyn AppSyncProvider,
//!     api_id: &str,
//! ) -> Result<Vec<RemoteDataSource>, ProviderError> {
//!     let page: Page<RemoteDataSource> = provider.list_data_sources(api_id, None).await?;
//!     Ok(page.items)
//! }
//! ```

mod error;
mod template;
mod traits;
mod types;

pub use error::{ErrorCategory, ProviderError};
pub use template::{FsTemplateSource, TemplateSource};
pub use traits::{AppSyncProvider, IamProvider};
pub use types::{
    Page, RemoteApi, RemoteApiKey, RemoteDataSource, RemoteFunction, RemoteResolver, RoleInfo,
    SchemaCreationStatus, SchemaStatus,
};

/// Type alias for a provider result.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Type alias for a shared provider trait object.
pub type DynProvider = std::sync::Arc<dyn AppSyncProvider>;

/// Type alias for a shared identity provider trait object.
pub type DynIam = std::sync::Arc<dyn IamProvider>;

/// Type alias for a shared template source trait object.
pub type DynTemplates = std::sync::Arc<dyn TemplateSource>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use appsync_provider::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AppSyncProvider, DynIam, DynProvider, DynTemplates, IamProvider, Page, ProviderError,
        ProviderResult, SchemaCreationStatus, SchemaStatus, TemplateSource,
    };
}
