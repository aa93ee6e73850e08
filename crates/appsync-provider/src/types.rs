//! Remote resource representations returned by providers.

use std::collections::BTreeMap;
use std::fmt;

use appsync_core::{ApiSettings, DataSourceSpec, FunctionSpec, ResolverSpec};
use serde::{Deserialize, Serialize};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Live GraphQL API container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteApi {
    pub api_id: String,
    pub arn: String,
    #[serde(default)]
    pub uris: BTreeMap<String, String>,
    #[serde(flatten)]
    pub settings: ApiSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDataSource {
    pub data_source_arn: String,
    pub spec: DataSourceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResolver {
    pub resolver_arn: String,
    pub spec: ResolverSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFunction {
    pub function_id: String,
    pub function_arn: String,
    pub spec: FunctionSpec,
}

/// API keys carry no name remotely; names live in the prior state only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApiKey {
    pub id: String,
    pub description: Option<String>,
    /// Epoch seconds.
    pub expires: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaCreationStatus {
    Processing,
    Active,
    Deleting,
    Failed,
    Success,
    NotApplicable,
}

impl SchemaCreationStatus {
    /// Statuses after which polling stops.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Success | Self::NotApplicable)
    }
}

impl fmt::Display for SchemaCreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Deleting => "DELETING",
            Self::Failed => "FAILED",
            Self::Success => "SUCCESS",
            Self::NotApplicable => "NOT_APPLICABLE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    pub status: SchemaCreationStatus,
    pub details: Option<String>,
}

impl SchemaStatus {
    pub fn new(status: SchemaCreationStatus) -> Self {
        Self {
            status,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub name: String,
    pub arn: String,
}
