//! Resolver reconciliation.

use std::collections::BTreeSet;

use appsync_core::{
    Applied, Mode, PlannedAction, RemoteRecord, ResolverSpec, ResolverState, duplicate_check,
    plan_actions, set_difference,
};
use futures_util::future::try_join_all;
use tracing::instrument;

use crate::error::SyncResult;
use crate::support::{ApiContext, delete_tolerant, list_all};

/// Converges the resolvers of every declared type to `desired`.
#[instrument(skip_all, fields(api_id = %ctx.api_id, desired = desired.len()))]
pub async fn reconcile_resolvers(
    ctx: &ApiContext<'_>,
    desired: &[ResolverSpec],
) -> SyncResult<Vec<Applied<ResolverSpec>>> {
    duplicate_check("resolver", ResolverSpec::NATURAL_KEY, desired)?;

    let resolved = desired
        .iter()
        .map(|resolver| {
            Ok(ResolverSpec {
                request_mapping_template: ctx
                    .templates
                    .read_opt(resolver.request_mapping_template.as_deref())?,
                response_mapping_template: ctx
                    .templates
                    .read_opt(resolver.response_mapping_template.as_deref())?,
                ..resolver.clone()
            })
        })
        .collect::<SyncResult<Vec<_>>>()?;

    let type_names: BTreeSet<&str> = desired.iter().map(|r| r.type_name.as_str()).collect();
    let listings = try_join_all(type_names.into_iter().map(|type_name| {
        list_all(move |token| ctx.provider.list_resolvers(ctx.api_id, type_name, token))
    }))
    .await?;
    let remote = listings
        .iter()
        .flatten()
        .map(|resolver| RemoteRecord::from_resource(&resolver.resolver_arn, &resolver.spec))
        .collect::<Result<Vec<_>, _>>()?;

    let actions = plan_actions(
        ResolverSpec::NATURAL_KEY,
        ResolverSpec::COMPARABLE_FIELDS,
        resolved,
        &remote,
    )?;
    let applied = try_join_all(actions.into_iter().map(|action| apply(ctx, action))).await?;

    tracing::info!(
        api_id = %ctx.api_id,
        created = applied.iter().filter(|a| a.mode == Mode::Create).count(),
        updated = applied.iter().filter(|a| a.mode == Mode::Update).count(),
        "Resolvers reconciled"
    );
    Ok(applied)
}

async fn apply(
    ctx: &ApiContext<'_>,
    action: PlannedAction<ResolverSpec>,
) -> SyncResult<Applied<ResolverSpec>> {
    match action {
        PlannedAction::Create(spec) => {
            let remote = ctx.provider.create_resolver(ctx.api_id, &spec).await?;
            tracing::info!(resolver = %spec.key(), "created resolver");
            Ok(Applied {
                id: remote.resolver_arn,
                resource: spec,
                mode: Mode::Create,
            })
        }
        PlannedAction::Update { desired, .. } => {
            let remote = ctx.provider.update_resolver(ctx.api_id, &desired).await?;
            tracing::info!(resolver = %desired.key(), "updated resolver");
            Ok(Applied {
                id: remote.resolver_arn,
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

/// Deletes resolvers recorded in `prior` that are no longer declared.
///
/// Returns the `Type.field` keys of the removed resolvers.
#[instrument(skip_all, fields(api_id = %ctx.api_id))]
pub async fn remove_obsolete_resolvers(
    ctx: &ApiContext<'_>,
    prior: &[ResolverState],
    desired: &[ResolverSpec],
) -> SyncResult<Vec<String>> {
    let obsolete = set_difference(ResolverSpec::NATURAL_KEY, prior, desired)?;
    let keys: Vec<String> = obsolete
        .iter()
        .map(|r| format!("{}.{}", r.type_name, r.field_name))
        .collect();

    try_join_all(obsolete.iter().zip(&keys).map(|(resolver, key)| {
        delete_tolerant(
            "resolver",
            key,
            ctx.provider
                .delete_resolver(ctx.api_id, &resolver.type_name, &resolver.field_name),
        )
    }))
    .await?;
    Ok(keys)
}

pub(crate) fn to_state(applied: &[Applied<ResolverSpec>]) -> Vec<ResolverState> {
    applied
        .iter()
        .map(|r| ResolverState {
            type_name: r.resource.type_name.clone(),
            field_name: r.resource.field_name.clone(),
        })
        .collect()
}
