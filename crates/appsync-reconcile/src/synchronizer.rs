//! Run orchestration: one call converges a whole API.

use std::sync::Arc;

use appsync_config::{SyncOptions, apply_overrides};
use appsync_core::diff::to_record;
use appsync_core::{
    ApiSettings, ApiState, Arn, Change, CoreError, DesiredConfig, Mode, ResourceKind, SyncState,
    keyed_equals,
};
use appsync_provider::{
    DynIam, DynProvider, DynTemplates, FsTemplateSource, ProviderError, RemoteApi,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::api_keys::{self, reconcile_api_keys, remove_obsolete_api_keys};
use crate::data_sources::{self, reconcile_data_sources, remove_obsolete_data_sources};
use crate::error::{SyncError, SyncResult};
use crate::functions::{self, reconcile_functions, remove_obsolete_functions};
use crate::output::SyncOutput;
use crate::resolvers::{self, reconcile_resolvers, remove_obsolete_resolvers};
use crate::role::{reconcile_service_role, remove_obsolete_role};
use crate::schema::converge_schema;
use crate::support::{ApiContext, delete_tolerant};

/// The API container a run works against.
struct ApiHandle {
    remote: RemoteApi,
    /// Created by this tool, so its settings and schema are managed here.
    owned: bool,
    mode: Mode,
}

/// Converges a managed GraphQL API and its resources to a declared configuration.
///
/// Resource kinds are applied in dependency order (service role, data
/// sources, schema, resolvers, functions, API keys) and obsolete resources
/// are removed afterwards, dependents first. The first failure aborts the
/// run; nothing is rolled back, and the next run resumes from the remote
/// listings.
///
/// # Example
///
/// ```ignore
/// let sync = Synchronizer::new(provider, iam).with_options(loaded.options);
/// let (state, output) = sync.synchronize(&loaded.desired, &prior).await?;
/// ```
pub struct Synchronizer {
    provider: DynProvider,
    iam: DynIam,
    templates: Option<DynTemplates>,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl Synchronizer {
    pub fn new(provider: DynProvider, iam: DynIam) -> Self {
        Self {
            provider,
            iam,
            templates: None,
            options: SyncOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the file-system template source rooted at `options.template_root`.
    pub fn with_templates(mut self, templates: DynTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts an in-flight run at the next step boundary or wait.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    fn template_source(&self) -> DynTemplates {
        self.templates.clone().unwrap_or_else(|| {
            Arc::new(FsTemplateSource::new(self.options.template_root.clone()))
        })
    }

    fn checkpoint(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    /// Runs one reconciliation pass.
    ///
    /// Returns the state to persist for the next run and a summary for the
    /// caller. No state is returned on error.
    #[instrument(skip_all, fields(backend = self.provider.backend_name()))]
    pub async fn synchronize(
        &self,
        desired: &DesiredConfig,
        prior: &SyncState,
    ) -> SyncResult<(SyncState, SyncOutput)> {
        desired.preflight()?;
        self.options.validate()?;
        self.checkpoint()?;

        let (api, prior) = self.ensure_api(desired, prior).await?;
        let api_id = api.remote.api_id.as_str();
        let api_arn = Arn::parse(&api.remote.arn)?;
        let templates = self.template_source();
        let ctx = ApiContext {
            provider: self.provider.as_ref(),
            templates: templates.as_ref(),
            api_id,
        };
        let mut changes = vec![Change::new(ResourceKind::GraphqlApi, api_id, api.mode)];

        self.checkpoint()?;
        let role = reconcile_service_role(
            self.iam.as_ref(),
            api_id,
            &api_arn,
            &desired.data_sources,
            prior.service_role.as_ref(),
            self.options.role_settle_delay(),
            &self.cancel,
        )
        .await?
        .map(|(state, mode)| {
            changes.push(Change::new(ResourceKind::ServiceRole, &state.name, mode));
            state
        });

        self.checkpoint()?;
        let applied_sources = reconcile_data_sources(
            &ctx,
            &desired.data_sources,
            role.as_ref().map(|r| r.arn.as_str()),
        )
        .await?;
        changes.extend(
            applied_sources
                .iter()
                .map(|ds| Change::new(ResourceKind::DataSource, &ds.resource.name, ds.mode)),
        );

        self.checkpoint()?;
        let schema = converge_schema(
            &ctx,
            desired.schema.as_deref(),
            prior.schema_checksum.as_deref(),
            api.owned,
            &self.options,
            &self.cancel,
        )
        .await?;
        if desired.schema.is_some() {
            changes.push(Change::new(ResourceKind::Schema, api_id, schema.mode));
        }

        self.checkpoint()?;
        let applied_resolvers = reconcile_resolvers(&ctx, &desired.resolvers).await?;
        changes.extend(
            applied_resolvers
                .iter()
                .map(|r| Change::new(ResourceKind::Resolver, r.resource.key(), r.mode)),
        );

        self.checkpoint()?;
        let applied_functions = reconcile_functions(&ctx, &desired.functions).await?;
        changes.extend(
            applied_functions
                .iter()
                .map(|f| Change::new(ResourceKind::Function, f.resource.key(), f.mode)),
        );

        self.checkpoint()?;
        let applied_keys = reconcile_api_keys(&ctx, &desired.api_keys, &prior.api_keys).await?;
        changes.extend(
            applied_keys
                .iter()
                .map(|k| Change::new(ResourceKind::ApiKey, &k.resource.name, k.mode)),
        );

        // Removals run dependents first so nothing still references a deleted resource.
        self.checkpoint()?;
        let key_names = desired.api_key_names()?;
        let removed = remove_obsolete_api_keys(&ctx, &prior.api_keys, &key_names).await?;
        changes.extend(deletions(ResourceKind::ApiKey, removed));
        let removed = remove_obsolete_resolvers(&ctx, &prior.resolvers, &desired.resolvers).await?;
        changes.extend(deletions(ResourceKind::Resolver, removed));
        let removed = remove_obsolete_functions(&ctx, &prior.functions, &desired.functions).await?;
        changes.extend(deletions(ResourceKind::Function, removed));
        let removed =
            remove_obsolete_data_sources(&ctx, &prior.data_sources, &desired.data_sources).await?;
        changes.extend(deletions(ResourceKind::DataSource, removed));
        let removed =
            remove_obsolete_role(self.iam.as_ref(), prior.service_role.as_ref(), role.as_ref())
                .await?;
        changes.extend(deletions(ResourceKind::ServiceRole, removed));

        let state = SyncState {
            api: Some(ApiState {
                id: api.remote.api_id.clone(),
                arn: api.remote.arn.clone(),
                name: api.remote.settings.name.clone(),
                uris: api.remote.uris.clone(),
                created: api.owned,
            }),
            schema_checksum: schema.checksum,
            service_role: role,
            api_keys: api_keys::to_state(&applied_keys),
            data_sources: data_sources::to_state(&applied_sources),
            resolvers: resolvers::to_state(&applied_resolvers),
            functions: functions::to_state(&applied_functions),
        };
        let output = SyncOutput {
            api_id: api.remote.api_id.clone(),
            arn: api.remote.arn.clone(),
            uris: api.remote.uris.clone(),
            api_keys: state.api_keys.clone(),
            changes,
        };

        tracing::info!(
            api_id = %output.api_id,
            created = output.changes.iter().filter(|c| c.mode == Mode::Create).count(),
            updated = output.changes.iter().filter(|c| c.mode == Mode::Update).count(),
            deleted = output.changes.iter().filter(|c| c.mode == Mode::Delete).count(),
            "Synchronization complete"
        );
        Ok((state, output))
    }

    /// Finds the API to work on, creating it when none is recorded or the
    /// recorded one vanished. The returned state is the prior state with
    /// records of a vanished or replaced API dropped.
    async fn ensure_api(
        &self,
        desired: &DesiredConfig,
        prior: &SyncState,
    ) -> SyncResult<(ApiHandle, SyncState)> {
        if let Some(api_id) = desired.api_id.as_deref() {
            let remote = self
                .provider
                .get_graphql_api(api_id)
                .await?
                .ok_or_else(|| ProviderError::not_found("graphql api", api_id))?;
            let (owned, prior) = match &prior.api {
                Some(recorded) if recorded.id == api_id => (recorded.created, prior.clone()),
                Some(recorded) => {
                    tracing::warn!(
                        recorded = %recorded.id,
                        api_id,
                        "managed API changed, discarding records of the previous one"
                    );
                    (false, prior.without_api_resources())
                }
                None => (false, prior.clone()),
            };
            let handle = self.converge_settings(desired, remote, owned).await?;
            return Ok((handle, prior));
        }

        if let Some(recorded) = &prior.api {
            if let Some(remote) = self.provider.get_graphql_api(&recorded.id).await? {
                let handle = self
                    .converge_settings(desired, remote, recorded.created)
                    .await?;
                return Ok((handle, prior.clone()));
            }
            tracing::warn!(api_id = %recorded.id, "recorded API no longer exists, recreating it");
            let fallback = ApiSettings {
                name: recorded.name.clone(),
                ..Default::default()
            };
            let handle = self.create_api(desired, Some(&fallback)).await?;
            return Ok((handle, prior.without_api_resources()));
        }

        let handle = self.create_api(desired, None).await?;
        Ok((handle, prior.clone()))
    }

    async fn create_api(
        &self,
        desired: &DesiredConfig,
        fallback: Option<&ApiSettings>,
    ) -> SyncResult<ApiHandle> {
        // Checked before creating so a bad config leaves nothing behind.
        if desired.schema.is_none() {
            return Err(CoreError::missing_field("graphql api", "schema").into());
        }
        let settings = apply_overrides(desired, fallback, &ApiSettings::default());
        settings.validate()?;

        let remote = self.provider.create_graphql_api(&settings).await?;
        tracing::info!(api_id = %remote.api_id, name = %settings.name, "created GraphQL API");
        Ok(ApiHandle {
            remote,
            owned: true,
            mode: Mode::Create,
        })
    }

    /// Updates an owned API whose settings drifted from the resolved ones.
    async fn converge_settings(
        &self,
        desired: &DesiredConfig,
        remote: RemoteApi,
        owned: bool,
    ) -> SyncResult<ApiHandle> {
        if !owned {
            tracing::debug!(api_id = %remote.api_id, "imported API, settings left untouched");
            return Ok(ApiHandle {
                remote,
                owned,
                mode: Mode::Ignore,
            });
        }

        let settings = apply_overrides(desired, Some(&remote.settings), &ApiSettings::default());
        settings.validate()?;
        if keyed_equals(
            ApiSettings::COMPARABLE_FIELDS,
            &to_record(&settings)?,
            &to_record(&remote.settings)?,
        ) {
            return Ok(ApiHandle {
                remote,
                owned,
                mode: Mode::Ignore,
            });
        }

        let updated = self
            .provider
            .update_graphql_api(&remote.api_id, &settings)
            .await?;
        tracing::info!(api_id = %updated.api_id, "updated GraphQL API settings");
        Ok(ApiHandle {
            remote: updated,
            owned,
            mode: Mode::Update,
        })
    }

    /// Deletes everything recorded in `prior`.
    ///
    /// An API created by this tool is deleted as a whole; for an imported API
    /// only the tracked resources are removed. The synthesized role goes last.
    #[instrument(skip_all, fields(api_id = prior.api_id()))]
    pub async fn teardown(&self, prior: &SyncState) -> SyncResult<Vec<Change>> {
        self.checkpoint()?;
        let mut changes = Vec::new();

        if let Some(api) = &prior.api {
            if api.created {
                delete_tolerant(
                    "graphql api",
                    &api.id,
                    self.provider.delete_graphql_api(&api.id),
                )
                .await?;
                changes.push(Change::new(ResourceKind::GraphqlApi, &api.id, Mode::Delete));
            } else {
                let templates = self.template_source();
                let ctx = ApiContext {
                    provider: self.provider.as_ref(),
                    templates: templates.as_ref(),
                    api_id: &api.id,
                };
                let removed = remove_obsolete_api_keys(&ctx, &prior.api_keys, &[]).await?;
                changes.extend(deletions(ResourceKind::ApiKey, removed));
                let removed = remove_obsolete_resolvers(&ctx, &prior.resolvers, &[]).await?;
                changes.extend(deletions(ResourceKind::Resolver, removed));
                let removed = remove_obsolete_functions(&ctx, &prior.functions, &[]).await?;
                changes.extend(deletions(ResourceKind::Function, removed));
                let removed = remove_obsolete_data_sources(&ctx, &prior.data_sources, &[]).await?;
                changes.extend(deletions(ResourceKind::DataSource, removed));
            }
        }

        self.checkpoint()?;
        let removed = remove_obsolete_role(self.iam.as_ref(), prior.service_role.as_ref(), None).await?;
        changes.extend(deletions(ResourceKind::ServiceRole, removed));

        tracing::info!(deleted = changes.len(), "Teardown complete");
        Ok(changes)
    }
}

fn deletions(
    kind: ResourceKind,
    keys: impl IntoIterator<Item = String>,
) -> impl Iterator<Item = Change> {
    keys.into_iter()
        .map(move |key| Change::new(kind, key, Mode::Delete))
}
