//! Provider capability traits.
//!
//! The reconciler only talks to the managed service through these traits.
//! Implementations must be thread-safe (`Send + Sync`) because resources of
//! one kind are mutated concurrently.

use async_trait::async_trait;

use appsync_core::{ApiSettings, DataSourceSpec, FunctionSpec, ResolverSpec};

use crate::error::ProviderError;
use crate::types::{
    Page, RemoteApi, RemoteApiKey, RemoteDataSource, RemoteFunction, RemoteResolver, RoleInfo,
    SchemaStatus,
};

/// Client for the managed GraphQL API service.
///
/// # Example
///
/// ```ignore
/// use appsync_provider::{AppSyncProvider, ProviderError, RemoteApi};
///
/// async fn existing(provider: &dyn AppSyncProvider, id: &str) -> Result<RemoteApi, ProviderError> {
///     provider
///         .get_graphql_api(id)
///         .await?
///         .ok_or_else(|| ProviderError::not_found("graphql api", id))
/// }
/// ```
#[async_trait]
pub trait AppSyncProvider: Send + Sync {
    // ==================== GraphQL API ====================

    async fn create_graphql_api(&self, settings: &ApiSettings) -> Result<RemoteApi, ProviderError>;

    /// Looks up an API by id.
    ///
    /// Returns `None` when the API does not exist.
    async fn get_graphql_api(&self, api_id: &str) -> Result<Option<RemoteApi>, ProviderError>;

    /// Replaces the settings of an existing API.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::NotFound` if the API does not exist.
    async fn update_graphql_api(
        &self,
        api_id: &str,
        settings: &ApiSettings,
    ) -> Result<RemoteApi, ProviderError>;

    /// Deletes an API together with every resource attached to it.
    async fn delete_graphql_api(&self, api_id: &str) -> Result<(), ProviderError>;

    // ==================== Data sources ====================

    async fn list_data_sources(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteDataSource>, ProviderError>;

    /// # Errors
    ///
    /// Returns `ProviderError::Conflict` if a data source with the same name exists.
    async fn create_data_source(
        &self,
        api_id: &str,
        spec: &DataSourceSpec,
    ) -> Result<RemoteDataSource, ProviderError>;

    async fn update_data_source(
        &self,
        api_id: &str,
        spec: &DataSourceSpec,
    ) -> Result<RemoteDataSource, ProviderError>;

    async fn delete_data_source(&self, api_id: &str, name: &str) -> Result<(), ProviderError>;

    // ==================== Resolvers ====================

    /// Lists the resolvers attached to fields of `type_name`.
    async fn list_resolvers(
        &self,
        api_id: &str,
        type_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteResolver>, ProviderError>;

    async fn create_resolver(
        &self,
        api_id: &str,
        spec: &ResolverSpec,
    ) -> Result<RemoteResolver, ProviderError>;

    async fn update_resolver(
        &self,
        api_id: &str,
        spec: &ResolverSpec,
    ) -> Result<RemoteResolver, ProviderError>;

    async fn delete_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<(), ProviderError>;

    // ==================== Functions ====================

    async fn list_functions(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteFunction>, ProviderError>;

    async fn create_function(
        &self,
        api_id: &str,
        spec: &FunctionSpec,
    ) -> Result<RemoteFunction, ProviderError>;

    /// Functions are addressed by their service-assigned id, not by name.
    async fn update_function(
        &self,
        api_id: &str,
        function_id: &str,
        spec: &FunctionSpec,
    ) -> Result<RemoteFunction, ProviderError>;

    async fn delete_function(&self, api_id: &str, function_id: &str)
    -> Result<(), ProviderError>;

    // ==================== API keys ====================

    async fn list_api_keys(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteApiKey>, ProviderError>;

    /// Creates a key. `expires` is epoch seconds; `None` lets the service pick.
    async fn create_api_key(
        &self,
        api_id: &str,
        description: Option<&str>,
        expires: Option<i64>,
    ) -> Result<RemoteApiKey, ProviderError>;

    async fn update_api_key(
        &self,
        api_id: &str,
        key_id: &str,
        description: Option<&str>,
        expires: Option<i64>,
    ) -> Result<RemoteApiKey, ProviderError>;

    async fn delete_api_key(&self, api_id: &str, key_id: &str) -> Result<(), ProviderError>;

    // ==================== Schema ====================

    /// Submits a schema definition. Creation continues asynchronously.
    async fn start_schema_creation(
        &self,
        api_id: &str,
        definition: &str,
    ) -> Result<SchemaStatus, ProviderError>;

    async fn get_schema_creation_status(&self, api_id: &str)
    -> Result<SchemaStatus, ProviderError>;

    /// Returns the name of this backend for diagnostics.
    fn backend_name(&self) -> &'static str {
        "unknown"
    }
}

/// Client for the identity service that owns the synthesized service role.
#[async_trait]
pub trait IamProvider: Send + Sync {
    /// Returns `None` when the role does not exist.
    async fn get_role(&self, role_name: &str) -> Result<Option<RoleInfo>, ProviderError>;

    async fn create_role(
        &self,
        role_name: &str,
        assume_role_policy: &str,
    ) -> Result<RoleInfo, ProviderError>;

    /// Creates or replaces an inline policy on the role.
    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProviderError>;

    async fn delete_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<(), ProviderError>;

    /// # Errors
    ///
    /// Returns `ProviderError::Conflict` while inline policies are still attached.
    async fn delete_role(&self, role_name: &str) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both traits must stay object-safe.
    fn _assert_provider_object_safe(_: &dyn AppSyncProvider) {}
    fn _assert_iam_object_safe(_: &dyn IamProvider) {}

    #[test]
    fn test_traits_are_object_safe() {
        fn is_send_sync<T: ?Sized + Send + Sync>() {}
        is_send_sync::<dyn AppSyncProvider>();
        is_send_sync::<dyn IamProvider>();
    }
}
