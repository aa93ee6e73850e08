//! Declared target configuration of one GraphQL API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{
    AdditionalAuthenticationProvider, AuthenticationType, LambdaAuthorizerConfig, LogConfig,
    OpenIdConnectConfig, UserPoolConfig,
};
use crate::diff::{deserialize_list, duplicate_check};
use crate::error::{CoreError, Result};
use crate::resources::{
    ApiKeySpec, DataSourceConfig, DataSourceSpec, FunctionSpec, ResolverSpec,
};

/// User-declared target for one reconciliation pass.
///
/// Fields left unset fall back to the recorded prior state and then to
/// defaults when the API settings are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Existing API to manage instead of creating one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_type: Option<AuthenticationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_config: Option<UserPoolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_config: Option<OpenIdConnectConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_authorizer_config: Option<LambdaAuthorizerConfig>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub additional_authentication_providers: Vec<AdditionalAuthenticationProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xray_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_config: Option<LogConfig>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Inline SDL or a path to a schema file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub data_sources: Vec<DataSourceSpec>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub resolvers: Vec<ResolverSpec>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub functions: Vec<FunctionSpec>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub api_keys: Vec<ApiKeySpec>,
}

impl DesiredConfig {
    /// Checks that must pass before any remote call is made.
    pub fn preflight(&self) -> Result<()> {
        duplicate_check("data source", DataSourceSpec::NATURAL_KEY, &self.data_sources)?;
        duplicate_check("resolver", ResolverSpec::NATURAL_KEY, &self.resolvers)?;
        duplicate_check("function", FunctionSpec::NATURAL_KEY, &self.functions)?;
        self.api_key_names()?;

        for data_source in &self.data_sources {
            if data_source.name.trim().is_empty() {
                return Err(CoreError::missing_field("data source", "name"));
            }
            // Only the synthesized role policy needs the domain and region.
            if let DataSourceConfig::AmazonElasticsearch(config) = &data_source.config
                && data_source.needs_synthesized_role()
            {
                crate::endpoint::parse_elasticsearch_endpoint(&config.endpoint)?;
            }
        }
        for resolver in &self.resolvers {
            if resolver.data_source_name.is_none() && resolver.pipeline_config.is_none() {
                return Err(CoreError::configuration(format!(
                    "resolver {} needs a dataSourceName or a pipelineConfig",
                    resolver.key()
                )));
            }
        }
        Ok(())
    }

    /// Names of the declared API keys; every key must be named and names must be unique.
    pub fn api_key_names(&self) -> Result<Vec<&str>> {
        let mut names: Vec<&str> = Vec::with_capacity(self.api_keys.len());
        for key in &self.api_keys {
            let name = key
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| CoreError::missing_field("api key", "name"))?;
            if names.contains(&name) {
                return Err(CoreError::duplicate_key("api key", "name", name));
            }
            names.push(name);
        }
        Ok(names)
    }
}
