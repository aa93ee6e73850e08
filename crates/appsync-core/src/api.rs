//! GraphQL API container settings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Primary or additional authorization mode of an API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationType {
    #[default]
    ApiKey,
    AwsIam,
    AmazonCognitoUserPools,
    OpenidConnect,
    AwsLambda,
}

impl AuthenticationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "API_KEY",
            Self::AwsIam => "AWS_IAM",
            Self::AmazonCognitoUserPools => "AMAZON_COGNITO_USER_POOLS",
            Self::OpenidConnect => "OPENID_CONNECT",
            Self::AwsLambda => "AWS_LAMBDA",
        }
    }
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoolConfig {
    pub user_pool_id: String,
    pub aws_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id_client_regex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenIdConnectConfig {
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat_ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_ttl: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaAuthorizerConfig {
    pub authorizer_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer_result_ttl_in_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_validation_expression: Option<String>,
}

/// Secondary authorization mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalAuthenticationProvider {
    pub authentication_type: AuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_config: Option<UserPoolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_config: Option<OpenIdConnectConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_authorizer_config: Option<LambdaAuthorizerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldLogLevel {
    #[default]
    None,
    Error,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default)]
    pub field_log_level: FieldLogLevel,
    pub cloud_watch_logs_role_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_verbose_content: Option<bool>,
}

/// Fully resolved settings of the API container, as sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    pub name: String,
    #[serde(default)]
    pub authentication_type: AuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_config: Option<UserPoolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_config: Option<OpenIdConnectConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_authorizer_config: Option<LambdaAuthorizerConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_authentication_providers: Vec<AdditionalAuthenticationProvider>,
    #[serde(default)]
    pub xray_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_config: Option<LogConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ApiSettings {
    /// Fields compared against the live API to decide whether an update is due.
    pub const COMPARABLE_FIELDS: &'static [&'static str] = &[
        "name",
        "authenticationType",
        "userPoolConfig",
        "openIdConnectConfig",
        "lambdaAuthorizerConfig",
        "additionalAuthenticationProviders",
        "xrayEnabled",
        "logConfig",
    ];

    /// Every authorization mode must carry the configuration block it needs.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::missing_field("graphql api", "name"));
        }
        check_auth_block(
            self.authentication_type,
            self.user_pool_config.is_some(),
            self.open_id_connect_config.is_some(),
            self.lambda_authorizer_config.is_some(),
        )?;
        for provider in &self.additional_authentication_providers {
            check_auth_block(
                provider.authentication_type,
                provider.user_pool_config.is_some(),
                provider.open_id_connect_config.is_some(),
                provider.lambda_authorizer_config.is_some(),
            )?;
        }
        Ok(())
    }
}

fn check_auth_block(
    auth: AuthenticationType,
    has_user_pool: bool,
    has_oidc: bool,
    has_lambda: bool,
) -> Result<()> {
    let missing = match auth {
        AuthenticationType::AmazonCognitoUserPools if !has_user_pool => Some("userPoolConfig"),
        AuthenticationType::OpenidConnect if !has_oidc => Some("openIdConnectConfig"),
        AuthenticationType::AwsLambda if !has_lambda => Some("lambdaAuthorizerConfig"),
        _ => None,
    };
    match missing {
        Some(field) => Err(CoreError::configuration(format!(
            "authentication type {auth} requires {field}"
        ))),
        None => Ok(()),
    }
}
