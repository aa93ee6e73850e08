use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use appsync_core::{ApiSettings, DataSourceSpec, FunctionSpec, ResolverKind, ResolverSpec};
use appsync_provider::{
    AppSyncProvider, Page, ProviderError, RemoteApi, RemoteApiKey, RemoteDataSource,
    RemoteFunction, RemoteResolver, SchemaCreationStatus, SchemaStatus,
};
use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::journal::CallJournal;

/// Lifetime the service gives a key created without an explicit expiry.
const DEFAULT_KEY_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Region and account stamped into generated ARNs.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub region: String,
    pub account_id: String,
    /// Maximum number of items per listing page.
    pub page_size: usize,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: "123456789012".to_string(),
            page_size: 25,
        }
    }
}

#[derive(Debug)]
struct ApiRecord {
    api: RemoteApi,
    data_sources: BTreeMap<String, RemoteDataSource>,
    resolvers: BTreeMap<(String, String), RemoteResolver>,
    functions: BTreeMap<String, RemoteFunction>,
    api_keys: BTreeMap<String, RemoteApiKey>,
    schema: Option<String>,
}

/// In-memory managed GraphQL API service.
///
/// Every API lives in a `DashMap` keyed by API id. Each operation is recorded
/// in a [`CallJournal`] so callers can assert on what was sent, and faults
/// can be queued per operation name.
#[derive(Debug)]
pub struct InMemoryProvider {
    apis: DashMap<String, ApiRecord>,
    options: ProviderOptions,
    journal: CallJournal,
    /// Statuses returned by successive schema status polls before `SUCCESS`.
    schema_script: Mutex<VecDeque<SchemaStatus>>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::with_options(ProviderOptions::default())
    }

    pub fn with_options(options: ProviderOptions) -> Self {
        Self {
            apis: DashMap::new(),
            options: ProviderOptions {
                page_size: options.page_size.max(1),
                ..options
            },
            journal: CallJournal::new(),
            schema_script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Queues `error` to be returned by the next call to `operation`.
    pub fn fail_on(&self, operation: &str, error: ProviderError) {
        self.journal.fail_on(operation, error);
    }

    /// Statuses the next schema polls report, in order. Once exhausted polls
    /// report `SUCCESS`.
    pub fn script_schema_statuses(&self, statuses: impl IntoIterator<Item = SchemaStatus>) {
        let mut script = self
            .schema_script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        script.extend(statuses);
    }

    pub fn api_ids(&self) -> Vec<String> {
        self.apis.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn schema_definition(&self, api_id: &str) -> Option<String> {
        self.apis.get(api_id).and_then(|record| record.schema.clone())
    }

    pub fn data_source(&self, api_id: &str, name: &str) -> Option<RemoteDataSource> {
        self.apis
            .get(api_id)
            .and_then(|record| record.data_sources.get(name).cloned())
    }

    pub fn resolver_count(&self, api_id: &str) -> usize {
        self.apis
            .get(api_id)
            .map_or(0, |record| record.resolvers.len())
    }

    pub fn function_count(&self, api_id: &str) -> usize {
        self.apis
            .get(api_id)
            .map_or(0, |record| record.functions.len())
    }

    pub fn api_key(&self, api_id: &str, key_id: &str) -> Option<RemoteApiKey> {
        self.apis
            .get(api_id)
            .and_then(|record| record.api_keys.get(key_id).cloned())
    }

    fn api_arn(&self, api_id: &str) -> String {
        format!(
            "arn:aws:appsync:{}:{}:apis/{}",
            self.options.region, self.options.account_id, api_id
        )
    }

    fn with_api<R>(
        &self,
        api_id: &str,
        f: impl FnOnce(&mut ApiRecord) -> Result<R, ProviderError>,
    ) -> Result<R, ProviderError> {
        let mut record = self
            .apis
            .get_mut(api_id)
            .ok_or_else(|| ProviderError::not_found("graphql api", api_id))?;
        f(record.value_mut())
    }

    fn paginate<T>(&self, items: Vec<T>, next_token: Option<String>) -> Result<Page<T>, ProviderError> {
        let start = match next_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ProviderError::invalid_request(format!("invalid next token: {token}")))?,
        };
        let total = items.len();
        let end = start.saturating_add(self.options.page_size).min(total);
        let items = items
            .into_iter()
            .skip(start)
            .take(self.options.page_size)
            .collect();
        Ok(Page {
            items,
            next_token: (end < total).then(|| end.to_string()),
        })
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn check_resolver_target(record: &ApiRecord, spec: &ResolverSpec) -> Result<(), ProviderError> {
    if spec.kind == ResolverKind::Unit {
        if let Some(name) = &spec.data_source_name {
            if !record.data_sources.contains_key(name) {
                return Err(ProviderError::invalid_request(format!(
                    "data source {name} does not exist"
                )));
            }
        }
    }
    Ok(())
}

fn check_function_target(record: &ApiRecord, spec: &FunctionSpec) -> Result<(), ProviderError> {
    if record.data_sources.contains_key(&spec.data_source_name) {
        Ok(())
    } else {
        Err(ProviderError::invalid_request(format!(
            "data source {} does not exist",
            spec.data_source_name
        )))
    }
}

#[async_trait]
impl AppSyncProvider for InMemoryProvider {
    async fn create_graphql_api(&self, settings: &ApiSettings) -> Result<RemoteApi, ProviderError> {
        self.journal.record("create_graphql_api", &settings.name)?;
        if settings.name.trim().is_empty() {
            return Err(ProviderError::invalid_request("api name must not be empty"));
        }

        let api_id = new_id();
        let api = RemoteApi {
            api_id: api_id.clone(),
            arn: self.api_arn(&api_id),
            uris: BTreeMap::from([(
                "GRAPHQL".to_string(),
                format!(
                    "https://{}.appsync-api.{}.amazonaws.com/graphql",
                    api_id, self.options.region
                ),
            )]),
            settings: settings.clone(),
        };
        self.apis.insert(
            api_id.clone(),
            ApiRecord {
                api: api.clone(),
                data_sources: BTreeMap::new(),
                resolvers: BTreeMap::new(),
                functions: BTreeMap::new(),
                api_keys: BTreeMap::new(),
                schema: None,
            },
        );
        tracing::debug!(api_id = %api_id, "created in-memory api");
        Ok(api)
    }

    async fn get_graphql_api(&self, api_id: &str) -> Result<Option<RemoteApi>, ProviderError> {
        self.journal.record("get_graphql_api", api_id)?;
        Ok(self.apis.get(api_id).map(|record| record.api.clone()))
    }

    async fn update_graphql_api(
        &self,
        api_id: &str,
        settings: &ApiSettings,
    ) -> Result<RemoteApi, ProviderError> {
        self.journal.record("update_graphql_api", api_id)?;
        self.with_api(api_id, |record| {
            record.api.settings = settings.clone();
            Ok(record.api.clone())
        })
    }

    async fn delete_graphql_api(&self, api_id: &str) -> Result<(), ProviderError> {
        self.journal.record("delete_graphql_api", api_id)?;
        self.apis
            .remove(api_id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::not_found("graphql api", api_id))
    }

    async fn list_data_sources(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteDataSource>, ProviderError> {
        self.journal.record("list_data_sources", api_id)?;
        let items = self.with_api(api_id, |record| {
            Ok(record.data_sources.values().cloned().collect::<Vec<_>>())
        })?;
        self.paginate(items, next_token)
    }

    async fn create_data_source(
        &self,
        api_id: &str,
        spec: &DataSourceSpec,
    ) -> Result<RemoteDataSource, ProviderError> {
        self.journal
            .record("create_data_source", format!("{api_id}/{}", spec.name))?;
        let arn = format!("{}/datasources/{}", self.api_arn(api_id), spec.name);
        self.with_api(api_id, |record| {
            if record.data_sources.contains_key(&spec.name) {
                return Err(ProviderError::conflict(
                    "data source",
                    &spec.name,
                    "already exists",
                ));
            }
            let remote = RemoteDataSource {
                data_source_arn: arn,
                spec: spec.clone(),
            };
            record.data_sources.insert(spec.name.clone(), remote.clone());
            Ok(remote)
        })
    }

    async fn update_data_source(
        &self,
        api_id: &str,
        spec: &DataSourceSpec,
    ) -> Result<RemoteDataSource, ProviderError> {
        self.journal
            .record("update_data_source", format!("{api_id}/{}", spec.name))?;
        self.with_api(api_id, |record| {
            let existing = record
                .data_sources
                .get_mut(&spec.name)
                .ok_or_else(|| ProviderError::not_found("data source", &spec.name))?;
            existing.spec = spec.clone();
            Ok(existing.clone())
        })
    }

    async fn delete_data_source(&self, api_id: &str, name: &str) -> Result<(), ProviderError> {
        self.journal
            .record("delete_data_source", format!("{api_id}/{name}"))?;
        self.with_api(api_id, |record| {
            record
                .data_sources
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found("data source", name))
        })
    }

    async fn list_resolvers(
        &self,
        api_id: &str,
        type_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteResolver>, ProviderError> {
        self.journal
            .record("list_resolvers", format!("{api_id}/{type_name}"))?;
        let items = self.with_api(api_id, |record| {
            Ok(record
                .resolvers
                .values()
                .filter(|resolver| resolver.spec.type_name == type_name)
                .cloned()
                .collect::<Vec<_>>())
        })?;
        self.paginate(items, next_token)
    }

    async fn create_resolver(
        &self,
        api_id: &str,
        spec: &ResolverSpec,
    ) -> Result<RemoteResolver, ProviderError> {
        self.journal
            .record("create_resolver", format!("{api_id}/{}", spec.key()))?;
        let arn = format!(
            "{}/types/{}/resolvers/{}",
            self.api_arn(api_id),
            spec.type_name,
            spec.field_name
        );
        self.with_api(api_id, |record| {
            let key = (spec.type_name.clone(), spec.field_name.clone());
            if record.resolvers.contains_key(&key) {
                return Err(ProviderError::conflict("resolver", spec.key(), "already exists"));
            }
            check_resolver_target(record, spec)?;
            let remote = RemoteResolver {
                resolver_arn: arn,
                spec: spec.clone(),
            };
            record.resolvers.insert(key, remote.clone());
            Ok(remote)
        })
    }

    async fn update_resolver(
        &self,
        api_id: &str,
        spec: &ResolverSpec,
    ) -> Result<RemoteResolver, ProviderError> {
        self.journal
            .record("update_resolver", format!("{api_id}/{}", spec.key()))?;
        self.with_api(api_id, |record| {
            check_resolver_target(record, spec)?;
            let key = (spec.type_name.clone(), spec.field_name.clone());
            let existing = record
                .resolvers
                .get_mut(&key)
                .ok_or_else(|| ProviderError::not_found("resolver", spec.key()))?;
            existing.spec = spec.clone();
            Ok(existing.clone())
        })
    }

    async fn delete_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<(), ProviderError> {
        let key = format!("{type_name}.{field_name}");
        self.journal
            .record("delete_resolver", format!("{api_id}/{key}"))?;
        self.with_api(api_id, |record| {
            record
                .resolvers
                .remove(&(type_name.to_string(), field_name.to_string()))
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found("resolver", key))
        })
    }

    async fn list_functions(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteFunction>, ProviderError> {
        self.journal.record("list_functions", api_id)?;
        let items = self.with_api(api_id, |record| {
            Ok(record.functions.values().cloned().collect::<Vec<_>>())
        })?;
        self.paginate(items, next_token)
    }

    async fn create_function(
        &self,
        api_id: &str,
        spec: &FunctionSpec,
    ) -> Result<RemoteFunction, ProviderError> {
        self.journal
            .record("create_function", format!("{api_id}/{}", spec.key()))?;
        let function_id = new_id();
        let arn = format!("{}/functions/{}", self.api_arn(api_id), function_id);
        self.with_api(api_id, |record| {
            check_function_target(record, spec)?;
            let remote = RemoteFunction {
                function_id: function_id.clone(),
                function_arn: arn,
                spec: spec.clone(),
            };
            record.functions.insert(function_id, remote.clone());
            Ok(remote)
        })
    }

    async fn update_function(
        &self,
        api_id: &str,
        function_id: &str,
        spec: &FunctionSpec,
    ) -> Result<RemoteFunction, ProviderError> {
        self.journal
            .record("update_function", format!("{api_id}/{function_id}"))?;
        self.with_api(api_id, |record| {
            check_function_target(record, spec)?;
            let existing = record
                .functions
                .get_mut(function_id)
                .ok_or_else(|| ProviderError::not_found("function", function_id))?;
            existing.spec = spec.clone();
            Ok(existing.clone())
        })
    }

    async fn delete_function(
        &self,
        api_id: &str,
        function_id: &str,
    ) -> Result<(), ProviderError> {
        self.journal
            .record("delete_function", format!("{api_id}/{function_id}"))?;
        self.with_api(api_id, |record| {
            record
                .functions
                .remove(function_id)
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found("function", function_id))
        })
    }

    async fn list_api_keys(
        &self,
        api_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<RemoteApiKey>, ProviderError> {
        self.journal.record("list_api_keys", api_id)?;
        let items = self.with_api(api_id, |record| {
            Ok(record.api_keys.values().cloned().collect::<Vec<_>>())
        })?;
        self.paginate(items, next_token)
    }

    async fn create_api_key(
        &self,
        api_id: &str,
        description: Option<&str>,
        expires: Option<i64>,
    ) -> Result<RemoteApiKey, ProviderError> {
        self.journal.record("create_api_key", api_id)?;
        let expires = expires
            .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp() + DEFAULT_KEY_LIFETIME_SECS);
        let key = RemoteApiKey {
            id: format!("da2-{}", new_id()),
            description: description.map(str::to_string),
            expires,
        };
        self.with_api(api_id, |record| {
            record.api_keys.insert(key.id.clone(), key.clone());
            Ok(key)
        })
    }

    async fn update_api_key(
        &self,
        api_id: &str,
        key_id: &str,
        description: Option<&str>,
        expires: Option<i64>,
    ) -> Result<RemoteApiKey, ProviderError> {
        self.journal
            .record("update_api_key", format!("{api_id}/{key_id}"))?;
        self.with_api(api_id, |record| {
            let existing = record
                .api_keys
                .get_mut(key_id)
                .ok_or_else(|| ProviderError::not_found("api key", key_id))?;
            existing.description = description.map(str::to_string);
            if let Some(expires) = expires {
                existing.expires = expires;
            }
            Ok(existing.clone())
        })
    }

    async fn delete_api_key(&self, api_id: &str, key_id: &str) -> Result<(), ProviderError> {
        self.journal
            .record("delete_api_key", format!("{api_id}/{key_id}"))?;
        self.with_api(api_id, |record| {
            record
                .api_keys
                .remove(key_id)
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found("api key", key_id))
        })
    }

    async fn start_schema_creation(
        &self,
        api_id: &str,
        definition: &str,
    ) -> Result<SchemaStatus, ProviderError> {
        self.journal.record("start_schema_creation", api_id)?;
        self.with_api(api_id, |record| {
            record.schema = Some(definition.to_string());
            Ok(SchemaStatus::new(SchemaCreationStatus::Processing))
        })
    }

    async fn get_schema_creation_status(
        &self,
        api_id: &str,
    ) -> Result<SchemaStatus, ProviderError> {
        self.journal.record("get_schema_creation_status", api_id)?;
        let has_schema = self.with_api(api_id, |record| Ok(record.schema.is_some()))?;
        if !has_schema {
            return Ok(SchemaStatus::new(SchemaCreationStatus::NotApplicable));
        }
        let scripted = self
            .schema_script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        Ok(scripted.unwrap_or_else(|| SchemaStatus::new(SchemaCreationStatus::Success)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsync_core::{DataSourceConfig, HttpConfig};

    fn settings(name: &str) -> ApiSettings {
        ApiSettings {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn http(name: &str) -> DataSourceSpec {
        DataSourceSpec {
            name: name.to_string(),
            description: None,
            service_role_arn: None,
            config: DataSourceConfig::Http(HttpConfig {
                endpoint: "https://example.com".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_api_lifecycle() {
        let provider = InMemoryProvider::new();
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();
        assert!(api.arn.ends_with(&format!("apis/{}", api.api_id)));
        assert!(api.uris.contains_key("GRAPHQL"));

        let fetched = provider.get_graphql_api(&api.api_id).await.unwrap();
        assert_eq!(fetched, Some(api.clone()));

        provider.delete_graphql_api(&api.api_id).await.unwrap();
        assert!(provider.get_graphql_api(&api.api_id).await.unwrap().is_none());
        assert!(
            provider
                .delete_graphql_api(&api.api_id)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_data_source_conflict_and_not_found() {
        let provider = InMemoryProvider::new();
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();

        provider.create_data_source(&api.api_id, &http("A")).await.unwrap();
        let err = provider
            .create_data_source(&api.api_id, &http("A"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = provider
            .update_data_source(&api.api_id, &http("B"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_listing_is_paginated() {
        let provider = InMemoryProvider::with_options(ProviderOptions {
            page_size: 2,
            ..Default::default()
        });
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();
        for name in ["A", "B", "C"] {
            provider.create_data_source(&api.api_id, &http(name)).await.unwrap();
        }

        let first = provider.list_data_sources(&api.api_id, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = provider
            .list_data_sources(&api.api_id, first.next_token.clone())
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn test_function_requires_data_source() {
        let provider = InMemoryProvider::new();
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();
        let spec: FunctionSpec =
            serde_json::from_value(serde_json::json!({"name": "f1", "dataSourceName": "A"}))
                .unwrap();

        assert!(provider.create_function(&api.api_id, &spec).await.is_err());
        provider.create_data_source(&api.api_id, &http("A")).await.unwrap();
        let created = provider.create_function(&api.api_id, &spec).await.unwrap();
        assert_eq!(provider.function_count(&api.api_id), 1);

        provider
            .delete_function(&api.api_id, &created.function_id)
            .await
            .unwrap();
        assert!(
            provider
                .delete_function(&api.api_id, &created.function_id)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_scripted_schema_statuses() {
        let provider = InMemoryProvider::new();
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();

        let status = provider.get_schema_creation_status(&api.api_id).await.unwrap();
        assert_eq!(status.status, SchemaCreationStatus::NotApplicable);

        provider.script_schema_statuses([SchemaStatus::new(SchemaCreationStatus::Processing)]);
        provider
            .start_schema_creation(&api.api_id, "type Query { a: String }")
            .await
            .unwrap();
        let first = provider.get_schema_creation_status(&api.api_id).await.unwrap();
        let second = provider.get_schema_creation_status(&api.api_id).await.unwrap();
        assert_eq!(first.status, SchemaCreationStatus::Processing);
        assert_eq!(second.status, SchemaCreationStatus::Success);
    }

    #[tokio::test]
    async fn test_api_key_default_expiry() {
        let provider = InMemoryProvider::new();
        let api = provider.create_graphql_api(&settings("blog")).await.unwrap();
        let key = provider
            .create_api_key(&api.api_id, Some("public"), None)
            .await
            .unwrap();
        assert!(key.id.starts_with("da2-"));
        assert!(key.expires > OffsetDateTime::now_utc().unix_timestamp());

        let updated = provider
            .update_api_key(&api.api_id, &key.id, None, Some(1_900_000_000))
            .await
            .unwrap();
        assert_eq!(updated.expires, 1_900_000_000);
        assert_eq!(updated.description, None);
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let provider = InMemoryProvider::new();
        provider.fail_on("create_graphql_api", ProviderError::throttled("slow down"));
        assert!(provider.create_graphql_api(&settings("blog")).await.is_err());
        assert!(provider.create_graphql_api(&settings("blog")).await.is_ok());
        assert_eq!(provider.journal().count("create_graphql_api"), 2);
    }
}
