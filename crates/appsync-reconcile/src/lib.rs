//! # appsync-reconcile
//!
//! Reconciliation engine that converges a managed GraphQL API to a declared
//! configuration.
//!
//! ## Overview
//!
//! Each resource kind has its own reconciler that lists the live resources,
//! classifies every declared one as create, update or ignore, applies the
//! mutations concurrently and reports the provider identifiers. The
//! [`Synchronizer`] sequences them:
//!
//! ```text
//!   fetch-or-create API ─► service role ─► data sources ─► schema (poll)
//!        ─► resolvers ─► functions ─► api keys ─► remove obsolete ─► state
//! ```
//!
//! The caller owns persistence: it hands in the [`SyncState`] of the last
//! successful run and stores the one returned.
//!
//! ## Example
//!
//! ```ignore
//! use appsync_config::load_desired_config;
//! use appsync_reconcile::{Synchronizer, SyncState};
//!
//! let loaded = load_desired_config("appsync.toml")?;
//! // `loaded.options.template_root` is already relative to the config file.
//! let sync = Synchronizer::new(provider, iam).with_options(loaded.options);
//! let (state, output) = sync.synchronize(&loaded.desired, &SyncState::default()).await?;
//! for change in output.mutations() {
//!     println!("{} {} {}", change.mode, change.kind, change.key);
//! }
//! ```
//!
//! [`SyncState`]: appsync_core::SyncState

pub mod api_keys;
pub mod data_sources;
mod error;
pub mod functions;
mod output;
pub mod policy;
pub mod resolvers;
pub mod role;
pub mod schema;
mod support;
mod synchronizer;

pub use api_keys::{ResolvedApiKey, reconcile_api_keys, remove_obsolete_api_keys};
pub use data_sources::{reconcile_data_sources, remove_obsolete_data_sources};
pub use error::{ErrorCategory, SyncError, SyncResult};
pub use functions::{reconcile_functions, remove_obsolete_functions};
pub use output::SyncOutput;
pub use policy::{PolicyDocument, PolicyStatement, synthesize_policy};
pub use resolvers::{reconcile_resolvers, remove_obsolete_resolvers};
pub use role::{reconcile_service_role, remove_obsolete_role, role_name};
pub use schema::{SchemaOutcome, converge_schema};
pub use support::{ApiContext, list_all};
pub use synchronizer::Synchronizer;

pub use appsync_core::{Change, DesiredConfig, Mode, ResourceKind, SyncState};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Change, DesiredConfig, Mode, ResourceKind, SyncError, SyncOutput, SyncResult, SyncState,
        Synchronizer,
    };
}
