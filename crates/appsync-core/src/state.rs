//! Persisted projection of the last successful reconciliation.
//!
//! Only the fields needed to find identifiers for deletion and to detect
//! no-op runs are kept; full remote objects are re-fetched every run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::DataSourceType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiState {
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub uris: BTreeMap<String, String>,
    /// True when this tool created the API and therefore owns its schema and lifecycle.
    #[serde(default)]
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleState {
    pub name: String,
    pub arn: String,
    pub policy_checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyState {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceState {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DataSourceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverState {
    pub type_name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionState {
    pub name: String,
    pub data_source_name: String,
    pub function_id: String,
}

/// Flat state snapshot handed in by the caller and handed back after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_role: Option<RoleState>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyState>,
    #[serde(default)]
    pub data_sources: Vec<DataSourceState>,
    #[serde(default)]
    pub resolvers: Vec<ResolverState>,
    #[serde(default)]
    pub functions: Vec<FunctionState>,
}

impl SyncState {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn api_id(&self) -> Option<&str> {
        self.api.as_ref().map(|api| api.id.as_str())
    }

    /// Same state with every API-scoped record dropped, keeping the role.
    ///
    /// Used when the recorded API no longer exists: the resources recorded
    /// under it disappeared with it.
    pub fn without_api_resources(&self) -> Self {
        Self {
            service_role: self.service_role.clone(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyncState {
        SyncState {
            api: Some(ApiState {
                id: "abc".to_string(),
                arn: "arn:aws:appsync:us-east-1:123456789012:apis/abc".to_string(),
                name: "blog".to_string(),
                uris: BTreeMap::from([(
                    "GRAPHQL".to_string(),
                    "https://abc.appsync-api.us-east-1.amazonaws.com/graphql".to_string(),
                )]),
                created: true,
            }),
            schema_checksum: Some("deadbeef".to_string()),
            service_role: None,
            api_keys: vec![ApiKeyState {
                name: "public".to_string(),
                id: "da2-xyz".to_string(),
            }],
            data_sources: vec![DataSourceState {
                name: "A".to_string(),
                kind: DataSourceType::AwsLambda,
            }],
            resolvers: vec![ResolverState {
                type_name: "Query".to_string(),
                field_name: "getPost".to_string(),
            }],
            functions: vec![FunctionState {
                name: "f1".to_string(),
                data_source_name: "A".to_string(),
                function_id: "fn-1".to_string(),
            }],
        }
    }

    #[test]
    fn test_state_json_layout() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["api"]["id"], "abc");
        assert_eq!(value["schemaChecksum"], "deadbeef");
        assert_eq!(value["apiKeys"][0]["id"], "da2-xyz");
        assert_eq!(value["dataSources"][0]["type"], "AWS_LAMBDA");
        assert_eq!(value["resolvers"][0]["typeName"], "Query");
        assert_eq!(value["functions"][0]["functionId"], "fn-1");
        assert!(value.get("serviceRole").is_none());
    }

    #[test]
    fn test_state_json_roundtrip() {
        let state = sample();
        let text = state.to_json_pretty().unwrap();
        assert_eq!(SyncState::from_json(&text).unwrap(), state);
    }

    #[test]
    fn test_empty_state_from_empty_object() {
        let state = SyncState::from_json("{}").unwrap();
        assert!(state.is_empty());
        assert_eq!(state.api_id(), None);
    }

    #[test]
    fn test_without_api_resources_keeps_role() {
        let mut state = sample();
        state.service_role = Some(RoleState {
            name: "role".to_string(),
            arn: "arn:aws:iam::123456789012:role/role".to_string(),
            policy_checksum: "c".to_string(),
        });
        let reset = state.without_api_resources();
        assert!(reset.api.is_none());
        assert!(reset.functions.is_empty());
        assert!(reset.service_role.is_some());
    }
}
