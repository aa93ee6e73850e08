//! Planned actions and their classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{keyed_equals, project, to_record};
use crate::error::Result;

/// What a run did, or will do, to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Create,
    Update,
    Ignore,
    Delete,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Ignore => write!(f, "ignore"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    GraphqlApi,
    ServiceRole,
    DataSource,
    Schema,
    Resolver,
    Function,
    ApiKey,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GraphqlApi => "graphql api",
            Self::ServiceRole => "service role",
            Self::DataSource => "data source",
            Self::Schema => "schema",
            Self::Resolver => "resolver",
            Self::Function => "function",
            Self::ApiKey => "api key",
        };
        f.write_str(name)
    }
}

/// Classified desired resource. `Update` and `Ignore` are bound to exactly one
/// existing remote identifier; `Create` has none until the provider assigns it.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction<T> {
    Create(T),
    Update { id: String, desired: T },
    Ignore { id: String, desired: T },
}

impl<T> PlannedAction<T> {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Create(_) => Mode::Create,
            Self::Update { .. } => Mode::Update,
            Self::Ignore { .. } => Mode::Ignore,
        }
    }

    pub fn desired(&self) -> &T {
        match self {
            Self::Create(desired)
            | Self::Update { desired, .. }
            | Self::Ignore { desired, .. } => desired,
        }
    }

    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Self::Create(_) => None,
            Self::Update { id, .. } | Self::Ignore { id, .. } => Some(id),
        }
    }
}

/// A resource after its action was applied, carrying its provider identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    pub id: String,
    pub resource: T,
    pub mode: Mode,
}

/// One line of the change log reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub kind: ResourceKind,
    pub key: String,
    pub mode: Mode,
}

impl Change {
    pub fn new(kind: ResourceKind, key: impl Into<String>, mode: Mode) -> Self {
        Self {
            kind,
            key: key.into(),
            mode,
        }
    }
}

/// Live resource reduced to its identifier and comparison record.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: String,
    pub record: Value,
}

impl RemoteRecord {
    pub fn from_resource<T: Serialize>(id: impl Into<String>, resource: &T) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            record: to_record(resource)?,
        })
    }
}

/// Matches each desired item to a remote one by `natural_key` and classifies it.
///
/// No match means create; a match that differs on `comparable` means update;
/// otherwise the item is left alone.
pub fn plan_actions<T: Serialize>(
    natural_key: &[&str],
    comparable: &[&str],
    desired: Vec<T>,
    remote: &[RemoteRecord],
) -> Result<Vec<PlannedAction<T>>> {
    let mut actions = Vec::with_capacity(desired.len());
    for item in desired {
        let record = to_record(&item)?;
        let key = project(natural_key, &record);
        let matched = remote
            .iter()
            .find(|candidate| project(natural_key, &candidate.record) == key);

        let action = match matched {
            None => PlannedAction::Create(item),
            Some(existing) if keyed_equals(comparable, &record, &existing.record) => {
                PlannedAction::Ignore {
                    id: existing.id.clone(),
                    desired: item,
                }
            }
            Some(existing) => PlannedAction::Update {
                id: existing.id.clone(),
                desired: item,
            },
        };
        tracing::debug!(key = ?key, mode = %action.mode(), "classified resource");
        actions.push(action);
    }
    Ok(actions)
}
