//! Declared resources attached to a GraphQL API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expiry::Expiry;

/// Backend kind of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceType {
    AwsLambda,
    AmazonDynamodb,
    AmazonElasticsearch,
    RelationalDatabase,
    Http,
    None,
}

impl DataSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsLambda => "AWS_LAMBDA",
            Self::AmazonDynamodb => "AMAZON_DYNAMODB",
            Self::AmazonElasticsearch => "AMAZON_ELASTICSEARCH",
            Self::RelationalDatabase => "RELATIONAL_DATABASE",
            Self::Http => "HTTP",
            Self::None => "NONE",
        }
    }

    /// Kinds whose access goes through an IAM service role.
    pub fn uses_service_role(&self) -> bool {
        matches!(
            self,
            Self::AwsLambda
                | Self::AmazonDynamodb
                | Self::AmazonElasticsearch
                | Self::RelationalDatabase
        )
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaConfig {
    pub lambda_function_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamoDbConfig {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_caller_credentials: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationalDatabaseConfig {
    pub db_cluster_identifier: String,
    pub aws_secret_store_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    pub endpoint: String,
}

/// Kind-specific configuration, serialized as `{"type": ..., "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceConfig {
    AwsLambda(LambdaConfig),
    AmazonDynamodb(DynamoDbConfig),
    AmazonElasticsearch(ElasticsearchConfig),
    RelationalDatabase(RelationalDatabaseConfig),
    Http(HttpConfig),
    None,
}

impl DataSourceConfig {
    pub fn kind(&self) -> DataSourceType {
        match self {
            Self::AwsLambda(_) => DataSourceType::AwsLambda,
            Self::AmazonDynamodb(_) => DataSourceType::AmazonDynamodb,
            Self::AmazonElasticsearch(_) => DataSourceType::AmazonElasticsearch,
            Self::RelationalDatabase(_) => DataSourceType::RelationalDatabase,
            Self::Http(_) => DataSourceType::Http,
            Self::None => DataSourceType::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_role_arn: Option<String>,
    #[serde(flatten)]
    pub config: DataSourceConfig,
}

impl DataSourceSpec {
    pub const NATURAL_KEY: &'static [&'static str] = &["name"];
    pub const COMPARABLE_FIELDS: &'static [&'static str] =
        &["name", "type", "description", "serviceRoleArn", "config"];

    pub fn kind(&self) -> DataSourceType {
        self.config.kind()
    }

    /// True when this data source should be granted access through the synthesized role.
    pub fn needs_synthesized_role(&self) -> bool {
        self.service_role_arn.is_none() && self.kind().uses_service_role()
    }

    /// Copy of this spec bound to `role_arn` when it has no explicit role of its own.
    pub fn with_default_role(&self, role_arn: Option<&str>) -> Self {
        match role_arn {
            Some(arn) if self.needs_synthesized_role() => Self {
                service_role_arn: Some(arn.to_string()),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolverKind {
    #[default]
    Unit,
    Pipeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default)]
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverSpec {
    pub type_name: String,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_name: Option<String>,
    #[serde(default)]
    pub kind: ResolverKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_config: Option<PipelineConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_mapping_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mapping_template: Option<String>,
}

impl ResolverSpec {
    pub const NATURAL_KEY: &'static [&'static str] = &["typeName", "fieldName"];
    pub const COMPARABLE_FIELDS: &'static [&'static str] = &[
        "dataSourceName",
        "kind",
        "pipelineConfig",
        "requestMappingTemplate",
        "responseMappingTemplate",
    ];

    /// `Type.field` rendering used in logs and change reports.
    pub fn key(&self) -> String {
        format!("{}.{}", self.type_name, self.field_name)
    }
}

fn default_function_version() -> String {
    "2018-05-29".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    pub data_source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_function_version")]
    pub function_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_mapping_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mapping_template: Option<String>,
}

impl FunctionSpec {
    pub const NATURAL_KEY: &'static [&'static str] = &["name", "dataSourceName"];
    pub const COMPARABLE_FIELDS: &'static [&'static str] = &[
        "description",
        "functionVersion",
        "requestMappingTemplate",
        "responseMappingTemplate",
    ];

    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.data_source_name)
    }
}

/// Declared API key. Accepts either a bare name or a detailed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ApiKeyDecl")]
pub struct ApiKeySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<Expiry>,
}

impl ApiKeySpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
            expires: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiKeyDecl {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        expires: Option<Expiry>,
    },
}

impl From<ApiKeyDecl> for ApiKeySpec {
    fn from(decl: ApiKeyDecl) -> Self {
        match decl {
            ApiKeyDecl::Name(name) => Self::named(name),
            ApiKeyDecl::Detailed {
                name,
                description,
                expires,
            } => Self {
                name,
                description,
                expires,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_serialization_shape() {
        let spec = DataSourceSpec {
            name: "posts".to_string(),
            description: None,
            service_role_arn: None,
            config: DataSourceConfig::AmazonDynamodb(DynamoDbConfig {
                table_name: "Posts".to_string(),
                aws_region: Some("eu-west-1".to_string()),
                use_caller_credentials: None,
            }),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["name"], "posts");
        assert_eq!(value["type"], "AMAZON_DYNAMODB");
        assert_eq!(value["config"]["tableName"], "Posts");
        assert!(value.get("serviceRoleArn").is_none());

        let parsed: DataSourceSpec = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_none_data_source_without_config() {
        let parsed: DataSourceSpec =
            serde_json::from_value(json!({"name": "local", "type": "NONE"})).unwrap();
        assert_eq!(parsed.kind(), DataSourceType::None);
        assert!(!parsed.needs_synthesized_role());
    }

    #[test]
    fn test_with_default_role() {
        let lambda: DataSourceSpec = serde_json::from_value(json!({
            "name": "A",
            "type": "AWS_LAMBDA",
            "config": {"lambdaFunctionArn": "arn:aws:lambda:us-east-1:123456789012:function:a"}
        }))
        .unwrap();
        assert!(lambda.needs_synthesized_role());

        let stamped = lambda.with_default_role(Some("arn:aws:iam::123456789012:role/r"));
        assert_eq!(
            stamped.service_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/r")
        );
        assert!(lambda.service_role_arn.is_none());

        let explicit = DataSourceSpec {
            service_role_arn: Some("arn:aws:iam::1:role/own".to_string()),
            ..lambda.clone()
        };
        let unchanged = explicit.with_default_role(Some("arn:aws:iam::1:role/other"));
        assert_eq!(
            unchanged.service_role_arn.as_deref(),
            Some("arn:aws:iam::1:role/own")
        );
    }

    #[test]
    fn test_resolver_defaults() {
        let resolver: ResolverSpec = serde_json::from_value(json!({
            "typeName": "Query",
            "fieldName": "getPost",
            "dataSourceName": "posts"
        }))
        .unwrap();
        assert_eq!(resolver.kind, ResolverKind::Unit);
        assert_eq!(resolver.key(), "Query.getPost");
    }

    #[test]
    fn test_function_default_version() {
        let function: FunctionSpec =
            serde_json::from_value(json!({"name": "f1", "dataSourceName": "A"})).unwrap();
        assert_eq!(function.function_version, "2018-05-29");
        assert_eq!(function.key(), "f1@A");
    }

    #[test]
    fn test_api_key_from_name_or_table() {
        let short: ApiKeySpec = serde_json::from_value(json!("public")).unwrap();
        assert_eq!(short, ApiKeySpec::named("public"));

        let detailed: ApiKeySpec = serde_json::from_value(json!({
            "name": "partner",
            "description": "partner access",
            "expires": 1700000000
        }))
        .unwrap();
        assert_eq!(detailed.name.as_deref(), Some("partner"));
        assert_eq!(detailed.expires, Some(Expiry::Epoch(1_700_000_000.0)));

        let unnamed: ApiKeySpec = serde_json::from_value(json!({"description": "x"})).unwrap();
        assert!(unnamed.name.is_none());
    }
}
