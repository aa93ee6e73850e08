//! Data source reconciliation.

use appsync_core::{
    Applied, DataSourceSpec, DataSourceState, Mode, PlannedAction, RemoteRecord, duplicate_check,
    plan_actions, set_difference,
};
use futures_util::future::try_join_all;
use tracing::instrument;

use crate::error::SyncResult;
use crate::support::{ApiContext, delete_tolerant, list_all};

/// Converges the API's data sources to `desired`.
///
/// Data sources without an explicit service role are bound to `role_arn`
/// before they are compared, so a role change shows up as an update.
#[instrument(skip_all, fields(api_id = %ctx.api_id, desired = desired.len()))]
pub async fn reconcile_data_sources(
    ctx: &ApiContext<'_>,
    desired: &[DataSourceSpec],
    role_arn: Option<&str>,
) -> SyncResult<Vec<Applied<DataSourceSpec>>> {
    duplicate_check("data source", DataSourceSpec::NATURAL_KEY, desired)?;

    let remote = list_all(|token| ctx.provider.list_data_sources(ctx.api_id, token)).await?;
    let remote = remote
        .iter()
        .map(|ds| RemoteRecord::from_resource(&ds.data_source_arn, &ds.spec))
        .collect::<Result<Vec<_>, _>>()?;

    let resolved: Vec<DataSourceSpec> = desired
        .iter()
        .map(|ds| ds.with_default_role(role_arn))
        .collect();
    let actions = plan_actions(
        DataSourceSpec::NATURAL_KEY,
        DataSourceSpec::COMPARABLE_FIELDS,
        resolved,
        &remote,
    )?;

    let applied = try_join_all(actions.into_iter().map(|action| apply(ctx, action))).await?;

    tracing::info!(
        api_id = %ctx.api_id,
        created = applied.iter().filter(|a| a.mode == Mode::Create).count(),
        updated = applied.iter().filter(|a| a.mode == Mode::Update).count(),
        "Data sources reconciled"
    );
    Ok(applied)
}

async fn apply(
    ctx: &ApiContext<'_>,
    action: PlannedAction<DataSourceSpec>,
) -> SyncResult<Applied<DataSourceSpec>> {
    match action {
        PlannedAction::Create(spec) => {
            let remote = ctx.provider.create_data_source(ctx.api_id, &spec).await?;
            tracing::info!(name = %spec.name, kind = %spec.kind(), "created data source");
            Ok(Applied {
                id: remote.data_source_arn,
                resource: spec,
                mode: Mode::Create,
            })
        }
        PlannedAction::Update { desired, .. } => {
            let remote = ctx.provider.update_data_source(ctx.api_id, &desired).await?;
            tracing::info!(name = %desired.name, kind = %desired.kind(), "updated data source");
            Ok(Applied {
                id: remote.data_source_arn,
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

/// Deletes data sources recorded in `prior` that are no longer declared.
///
/// Returns the names of the removed data sources.
#[instrument(skip_all, fields(api_id = %ctx.api_id))]
pub async fn remove_obsolete_data_sources(
    ctx: &ApiContext<'_>,
    prior: &[DataSourceState],
    desired: &[DataSourceSpec],
) -> SyncResult<Vec<String>> {
    let obsolete = set_difference(DataSourceSpec::NATURAL_KEY, prior, desired)?;
    try_join_all(obsolete.iter().map(|ds| {
        delete_tolerant(
            "data source",
            &ds.name,
            ctx.provider.delete_data_source(ctx.api_id, &ds.name),
        )
    }))
    .await?;
    Ok(obsolete.into_iter().map(|ds| ds.name.clone()).collect())
}

pub(crate) fn to_state(applied: &[Applied<DataSourceSpec>]) -> Vec<DataSourceState> {
    applied
        .iter()
        .map(|ds| DataSourceState {
            name: ds.resource.name.clone(),
            kind: ds.resource.kind(),
        })
        .collect()
}
