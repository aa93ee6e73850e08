//! API key reconciliation.
//!
//! The service does not store key names. A key's name is recovered by
//! joining the prior state's (name, id) pairs with the live listing; live
//! keys unknown to the state are left alone.

use appsync_core::{
    ApiKeySpec, ApiKeyState, Applied, CoreError, Mode, PlannedAction, duplicate_check,
    normalize_expiry,
};
use appsync_provider::RemoteApiKey;
use futures_util::future::try_join_all;
use tracing::instrument;

use crate::error::SyncResult;
use crate::support::{ApiContext, delete_tolerant, list_all};

/// Declared key with its expiry normalized to epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApiKey {
    pub name: String,
    pub description: Option<String>,
    pub expires: Option<i64>,
}

impl ResolvedApiKey {
    fn from_spec(spec: &ApiKeySpec) -> SyncResult<Self> {
        let name = spec
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CoreError::missing_field("api key", "name"))?;
        Ok(Self {
            name,
            description: spec.description.clone(),
            expires: normalize_expiry(spec.expires.as_ref())?,
        })
    }

    /// An unspecified expiry never triggers an update.
    fn matches(&self, remote: &RemoteApiKey) -> bool {
        self.description == remote.description
            && self.expires.is_none_or(|expires| expires == remote.expires)
    }
}

/// Classifies each declared key against the live keys recorded in `prior`.
pub fn plan_api_keys(
    desired: &[ApiKeySpec],
    prior: &[ApiKeyState],
    remote: &[RemoteApiKey],
) -> SyncResult<Vec<PlannedAction<ResolvedApiKey>>> {
    let resolved = desired
        .iter()
        .map(ResolvedApiKey::from_spec)
        .collect::<SyncResult<Vec<_>>>()?;
    duplicate_check("api key", &["name"], desired)?;

    let named: Vec<(&str, &RemoteApiKey)> = prior
        .iter()
        .filter_map(|state| {
            remote
                .iter()
                .find(|key| key.id == state.id)
                .map(|key| (state.name.as_str(), key))
        })
        .collect();

    Ok(resolved
        .into_iter()
        .map(|key| {
            let existing = named
                .iter()
                .find(|(name, _)| *name == key.name)
                .map(|(_, remote)| *remote);
            match existing {
                None => PlannedAction::Create(key),
                Some(remote) if key.matches(remote) => PlannedAction::Ignore {
                    id: remote.id.clone(),
                    desired: key,
                },
                Some(remote) => PlannedAction::Update {
                    id: remote.id.clone(),
                    desired: key,
                },
            }
        })
        .collect())
}

#[instrument(skip_all, fields(api_id = %ctx.api_id, desired = desired.len()))]
pub async fn reconcile_api_keys(
    ctx: &ApiContext<'_>,
    desired: &[ApiKeySpec],
    prior: &[ApiKeyState],
) -> SyncResult<Vec<Applied<ResolvedApiKey>>> {
    let remote = list_all(|token| ctx.provider.list_api_keys(ctx.api_id, token)).await?;
    let actions = plan_api_keys(desired, prior, &remote)?;

    let applied = try_join_all(actions.into_iter().map(|action| apply(ctx, action))).await?;

    tracing::info!(
        api_id = %ctx.api_id,
        created = applied.iter().filter(|a| a.mode == Mode::Create).count(),
        updated = applied.iter().filter(|a| a.mode == Mode::Update).count(),
        "API keys reconciled"
    );
    Ok(applied)
}

async fn apply(
    ctx: &ApiContext<'_>,
    action: PlannedAction<ResolvedApiKey>,
) -> SyncResult<Applied<ResolvedApiKey>> {
    match action {
        PlannedAction::Create(key) => {
            let remote = ctx
                .provider
                .create_api_key(ctx.api_id, key.description.as_deref(), key.expires)
                .await?;
            tracing::info!(name = %key.name, "created api key");
            Ok(Applied {
                id: remote.id,
                resource: key,
                mode: Mode::Create,
            })
        }
        PlannedAction::Update { id, desired } => {
            ctx.provider
                .update_api_key(ctx.api_id, &id, desired.description.as_deref(), desired.expires)
                .await?;
            tracing::info!(name = %desired.name, "updated api key");
            Ok(Applied {
                id,
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

/// Deletes keys recorded in `prior` whose name is no longer declared.
#[instrument(skip_all, fields(api_id = %ctx.api_id))]
pub async fn remove_obsolete_api_keys(
    ctx: &ApiContext<'_>,
    prior: &[ApiKeyState],
    desired_names: &[&str],
) -> SyncResult<Vec<String>> {
    let obsolete: Vec<&ApiKeyState> = prior
        .iter()
        .filter(|key| !desired_names.contains(&key.name.as_str()))
        .collect();

    try_join_all(obsolete.iter().map(|key| {
        delete_tolerant(
            "api key",
            &key.name,
            ctx.provider.delete_api_key(ctx.api_id, &key.id),
        )
    }))
    .await?;
    Ok(obsolete.into_iter().map(|key| key.name.clone()).collect())
}

pub(crate) fn to_state(applied: &[Applied<ResolvedApiKey>]) -> Vec<ApiKeyState> {
    applied
        .iter()
        .map(|key| ApiKeyState {
            name: key.resource.name.clone(),
            id: key.id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsync_core::Expiry;

    fn remote(id: &str, description: Option<&str>, expires: i64) -> RemoteApiKey {
        RemoteApiKey {
            id: id.to_string(),
            description: description.map(str::to_string),
            expires,
        }
    }

    fn prior(name: &str, id: &str) -> ApiKeyState {
        ApiKeyState {
            name: name.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn test_unknown_name_is_created() {
        let actions = plan_api_keys(&[ApiKeySpec::named("public")], &[], &[]).unwrap();
        assert_eq!(actions[0].mode(), Mode::Create);
    }

    #[test]
    fn test_name_recovered_from_prior_state() {
        let live = [remote("da2-1", None, 1_800_000_000)];
        let actions =
            plan_api_keys(&[ApiKeySpec::named("public")], &[prior("public", "da2-1")], &live)
                .unwrap();
        // No expiry declared: not compared.
        assert_eq!(actions[0].mode(), Mode::Ignore);
        assert_eq!(actions[0].remote_id(), Some("da2-1"));
    }

    #[test]
    fn test_expiry_change_is_an_update() {
        let live = [remote("da2-1", None, 1_800_000_000)];
        let spec = ApiKeySpec {
            expires: Some(Expiry::Epoch(1_900_000_000_000.0)),
            ..ApiKeySpec::named("public")
        };
        let actions = plan_api_keys(&[spec], &[prior("public", "da2-1")], &live).unwrap();
        assert_eq!(actions[0].mode(), Mode::Update);
        assert_eq!(actions[0].desired().expires, Some(1_900_000_000));

        let same = ApiKeySpec {
            expires: Some(Expiry::Epoch(1_800_000_000.0)),
            ..ApiKeySpec::named("public")
        };
        let actions = plan_api_keys(&[same], &[prior("public", "da2-1")], &live).unwrap();
        assert_eq!(actions[0].mode(), Mode::Ignore);
    }

    #[test]
    fn test_vanished_key_is_recreated() {
        let actions =
            plan_api_keys(&[ApiKeySpec::named("public")], &[prior("public", "da2-gone")], &[])
                .unwrap();
        assert_eq!(actions[0].mode(), Mode::Create);
    }

    #[test]
    fn test_unnamed_and_duplicate_keys_rejected() {
        let unnamed = ApiKeySpec {
            name: None,
            description: Some("x".to_string()),
            expires: None,
        };
        assert!(plan_api_keys(&[unnamed], &[], &[]).unwrap_err().is_configuration_error());

        let err = plan_api_keys(
            &[ApiKeySpec::named("a"), ApiKeySpec::named("a")],
            &[],
            &[],
        )
        .unwrap_err();
        assert!(err.is_configuration_error());
    }
}
