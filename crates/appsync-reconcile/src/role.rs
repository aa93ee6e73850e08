//! Service role lifecycle.

use std::time::Duration;

use appsync_core::{Arn, DataSourceSpec, Mode, RoleState, checksum};
use appsync_provider::IamProvider;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::SyncResult;
use crate::policy::{assume_role_policy, synthesize_policy};
use crate::support::{delete_tolerant, pause};

/// Name of the inline policy attached to the synthesized role.
pub const POLICY_NAME: &str = "appsync-data-source-access";

pub fn role_name(api_id: &str) -> String {
    format!("appsync-{api_id}-service-role")
}

/// Ensures the synthesized role exists and carries the current policy.
///
/// Returns `None` when no data source relies on the role. After the role is
/// created or its policy replaced, waits `settle` so the identity service
/// can propagate the change before data sources reference it.
#[instrument(skip_all, fields(api_id = %api_id))]
pub async fn reconcile_service_role(
    iam: &dyn IamProvider,
    api_id: &str,
    api_arn: &Arn,
    data_sources: &[DataSourceSpec],
    prior: Option<&RoleState>,
    settle: Duration,
    cancel: &CancellationToken,
) -> SyncResult<Option<(RoleState, Mode)>> {
    let Some(policy) = synthesize_policy(data_sources, api_arn)? else {
        tracing::debug!("no data source needs the synthesized role");
        return Ok(None);
    };
    let document = policy.to_json()?;
    let digest = checksum(&document);
    let name = role_name(api_id);

    let (role, created) = match iam.get_role(&name).await? {
        Some(role) => (role, false),
        None => {
            let role = iam.create_role(&name, &assume_role_policy()).await?;
            tracing::info!(role = %name, "created service role");
            (role, true)
        }
    };

    let policy_changed = prior.is_none_or(|p| p.name != name || p.policy_checksum != digest);
    let mode = if created {
        Mode::Create
    } else if policy_changed {
        Mode::Update
    } else {
        Mode::Ignore
    };

    if created || policy_changed {
        iam.put_role_policy(&name, POLICY_NAME, &document).await?;
        tracing::info!(
            role = %name,
            statements = policy.statement.len(),
            "service role policy applied"
        );
        pause(settle, cancel).await?;
    }

    Ok(Some((
        RoleState {
            name,
            arn: role.arn,
            policy_checksum: digest,
        },
        mode,
    )))
}

/// Deletes the previously synthesized role when the run no longer uses it.
///
/// Returns the removed role's name.
#[instrument(skip_all)]
pub async fn remove_obsolete_role(
    iam: &dyn IamProvider,
    prior: Option<&RoleState>,
    current: Option<&RoleState>,
) -> SyncResult<Option<String>> {
    let Some(prior) = prior else {
        return Ok(None);
    };
    if current.is_some_and(|current| current.name == prior.name) {
        return Ok(None);
    }

    // The role cannot be deleted while a policy is attached.
    delete_tolerant(
        "role policy",
        POLICY_NAME,
        iam.delete_role_policy(&prior.name, POLICY_NAME),
    )
    .await?;
    delete_tolerant("service role", &prior.name, iam.delete_role(&prior.name)).await?;
    Ok(Some(prior.name.clone()))
}
