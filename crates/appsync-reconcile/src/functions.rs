//! Pipeline function reconciliation.
//!
//! Functions are matched on (name, data source). The service addresses them
//! by an opaque function id, which is what the state records for deletion.

use appsync_core::{
    Applied, FunctionSpec, FunctionState, Mode, PlannedAction, RemoteRecord, duplicate_check,
    plan_actions, set_difference,
};
use futures_util::future::try_join_all;
use tracing::instrument;

use crate::error::SyncResult;
use crate::support::{ApiContext, delete_tolerant, list_all};

#[instrument(skip_all, fields(api_id = %ctx.api_id, desired = desired.len()))]
pub async fn reconcile_functions(
    ctx: &ApiContext<'_>,
    desired: &[FunctionSpec],
) -> SyncResult<Vec<Applied<FunctionSpec>>> {
    duplicate_check("function", FunctionSpec::NATURAL_KEY, desired)?;

    let resolved = desired
        .iter()
        .map(|function| {
            Ok(FunctionSpec {
                request_mapping_template: ctx
                    .templates
                    .read_opt(function.request_mapping_template.as_deref())?,
                response_mapping_template: ctx
                    .templates
                    .read_opt(function.response_mapping_template.as_deref())?,
                ..function.clone()
            })
        })
        .collect::<SyncResult<Vec<_>>>()?;

    let remote = list_all(|token| ctx.provider.list_functions(ctx.api_id, token)).await?;
    let remote = remote
        .iter()
        .map(|function| RemoteRecord::from_resource(&function.function_id, &function.spec))
        .collect::<Result<Vec<_>, _>>()?;

    let actions = plan_actions(
        FunctionSpec::NATURAL_KEY,
        FunctionSpec::COMPARABLE_FIELDS,
        resolved,
        &remote,
    )?;
    let applied = try_join_all(actions.into_iter().map(|action| apply(ctx, action))).await?;

    tracing::info!(
        api_id = %ctx.api_id,
        created = applied.iter().filter(|a| a.mode == Mode::Create).count(),
        updated = applied.iter().filter(|a| a.mode == Mode::Update).count(),
        "Functions reconciled"
    );
    Ok(applied)
}

async fn apply(
    ctx: &ApiContext<'_>,
    action: PlannedAction<FunctionSpec>,
) -> SyncResult<Applied<FunctionSpec>> {
    match action {
        PlannedAction::Create(spec) => {
            let remote = ctx.provider.create_function(ctx.api_id, &spec).await?;
            tracing::info!(function = %spec.key(), function_id = %remote.function_id, "created function");
            Ok(Applied {
                id: remote.function_id,
                resource: spec,
                mode: Mode::Create,
            })
        }
        PlannedAction::Update { id, desired } => {
            let remote = ctx
                .provider
                .update_function(ctx.api_id, &id, &desired)
                .await?;
            tracing::info!(function = %desired.key(), function_id = %id, "updated function");
            Ok(Applied {
                id: remote.function_id,
                resource: desired,
                mode: Mode::Update,
            })
        }
        PlannedAction::Ignore { id, desired } => Ok(Applied {
            id,
            resource: desired,
            mode: Mode::Ignore,
        }),
    }
}

/// Deletes functions recorded in `prior` whose (name, data source) is no
/// longer declared, by their recorded function id.
#[instrument(skip_all, fields(api_id = %ctx.api_id))]
pub async fn remove_obsolete_functions(
    ctx: &ApiContext<'_>,
    prior: &[FunctionState],
    desired: &[FunctionSpec],
) -> SyncResult<Vec<String>> {
    let obsolete = set_difference(FunctionSpec::NATURAL_KEY, prior, desired)?;
    try_join_all(obsolete.iter().map(|function| {
        delete_tolerant(
            "function",
            &function.function_id,
            ctx.provider.delete_function(ctx.api_id, &function.function_id),
        )
    }))
    .await?;
    Ok(obsolete
        .into_iter()
        .map(|function| format!("{}@{}", function.name, function.data_source_name))
        .collect())
}

pub(crate) fn to_state(applied: &[Applied<FunctionSpec>]) -> Vec<FunctionState> {
    applied
        .iter()
        .map(|function| FunctionState {
            name: function.resource.name.clone(),
            data_source_name: function.resource.data_source_name.clone(),
            function_id: function.id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsync_core::{ApiSettings, DataSourceSpec};
    use appsync_provider::{AppSyncProvider, FsTemplateSource};
    use appsync_provider_memory::InMemoryProvider;
    use serde_json::json;

    fn function(name: &str, description: Option<&str>) -> FunctionSpec {
        serde_json::from_value(json!({
            "name": name,
            "dataSourceName": "A",
            "description": description,
            "requestMappingTemplate": "{}",
            "responseMappingTemplate": "$util.toJson($ctx.result)"
        }))
        .unwrap()
    }

    async fn setup(provider: &InMemoryProvider) -> String {
        let settings = ApiSettings {
            name: "blog".to_string(),
            ..Default::default()
        };
        let api_id = provider.create_graphql_api(&settings).await.unwrap().api_id;
        let source: DataSourceSpec =
            serde_json::from_value(json!({"name": "A", "type": "NONE"})).unwrap();
        provider.create_data_source(&api_id, &source).await.unwrap();
        api_id
    }

    #[tokio::test]
    async fn test_update_addresses_function_id() {
        let provider = InMemoryProvider::new();
        let templates = FsTemplateSource::default();
        let api_id = setup(&provider).await;
        let ctx = ApiContext {
            provider: &provider,
            templates: &templates,
            api_id: &api_id,
        };

        let created = reconcile_functions(&ctx, &[function("f1", None)]).await.unwrap();
        assert_eq!(created[0].mode, Mode::Create);

        let updated = reconcile_functions(&ctx, &[function("f1", Some("now described"))])
            .await
            .unwrap();
        assert_eq!(updated[0].mode, Mode::Update);
        assert_eq!(updated[0].id, created[0].id);
        assert_eq!(
            provider.journal().targets("update_function"),
            vec![format!("{api_id}/{}", created[0].id)]
        );
    }

    #[tokio::test]
    async fn test_remove_obsolete_by_recorded_id() {
        let provider = InMemoryProvider::new();
        let templates = FsTemplateSource::default();
        let api_id = setup(&provider).await;
        let ctx = ApiContext {
            provider: &provider,
            templates: &templates,
            api_id: &api_id,
        };
        let applied = reconcile_functions(&ctx, &[function("f1", None)]).await.unwrap();
        let prior = to_state(&applied);

        let removed = remove_obsolete_functions(&ctx, &prior, &[]).await.unwrap();
        assert_eq!(removed, vec!["f1@A".to_string()]);
        assert_eq!(provider.function_count(&api_id), 0);
        assert_eq!(provider.journal().count("delete_function"), 1);

        // Repeating the delete against the same prior state is harmless.
        remove_obsolete_functions(&ctx, &prior, &[]).await.unwrap();
        assert_eq!(provider.journal().count("delete_function"), 2);
    }
}
