//! Resolution of API container settings from layered inputs.

use std::collections::BTreeMap;

use appsync_core::{
    AdditionalAuthenticationProvider, ApiSettings, AuthenticationType, DesiredConfig,
    LambdaAuthorizerConfig, LogConfig, OpenIdConnectConfig, UserPoolConfig,
};

/// API settings where every field may be unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialApiSettings {
    pub name: Option<String>,
    pub authentication_type: Option<AuthenticationType>,
    pub user_pool_config: Option<UserPoolConfig>,
    pub open_id_connect_config: Option<OpenIdConnectConfig>,
    pub lambda_authorizer_config: Option<LambdaAuthorizerConfig>,
    pub additional_authentication_providers: Option<Vec<AdditionalAuthenticationProvider>>,
    pub xray_enabled: Option<bool>,
    pub log_config: Option<LogConfig>,
    pub tags: Option<BTreeMap<String, String>>,
}

fn non_empty<T>(items: &[T]) -> Option<Vec<T>>
where
    T: Clone,
{
    (!items.is_empty()).then(|| items.to_vec())
}

impl PartialApiSettings {
    pub fn from_desired(desired: &DesiredConfig) -> Self {
        Self {
            name: desired.name.clone(),
            authentication_type: desired.authentication_type,
            user_pool_config: desired.user_pool_config.clone(),
            open_id_connect_config: desired.open_id_connect_config.clone(),
            lambda_authorizer_config: desired.lambda_authorizer_config.clone(),
            additional_authentication_providers: non_empty(
                &desired.additional_authentication_providers,
            ),
            xray_enabled: desired.xray_enabled,
            log_config: desired.log_config.clone(),
            tags: (!desired.tags.is_empty()).then(|| desired.tags.clone()),
        }
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self {
            name: Some(settings.name.clone()).filter(|name| !name.is_empty()),
            authentication_type: Some(settings.authentication_type),
            user_pool_config: settings.user_pool_config.clone(),
            open_id_connect_config: settings.open_id_connect_config.clone(),
            lambda_authorizer_config: settings.lambda_authorizer_config.clone(),
            additional_authentication_providers: non_empty(
                &settings.additional_authentication_providers,
            ),
            xray_enabled: Some(settings.xray_enabled),
            log_config: settings.log_config.clone(),
            tags: (!settings.tags.is_empty()).then(|| settings.tags.clone()),
        }
    }

    /// Fills every unset field from `fallback`.
    ///
    /// When this layer picks a different authentication type than the
    /// fallback, the fallback's auth configuration blocks are not inherited.
    pub fn or(self, fallback: Self) -> Self {
        let switches_auth = matches!(
            (self.authentication_type, fallback.authentication_type),
            (Some(ours), Some(theirs)) if ours != theirs
        );
        let (user_pool, oidc, lambda) = if switches_auth {
            (None, None, None)
        } else {
            (
                fallback.user_pool_config,
                fallback.open_id_connect_config,
                fallback.lambda_authorizer_config,
            )
        };

        Self {
            name: self.name.or(fallback.name),
            authentication_type: self.authentication_type.or(fallback.authentication_type),
            user_pool_config: self.user_pool_config.or(user_pool),
            open_id_connect_config: self.open_id_connect_config.or(oidc),
            lambda_authorizer_config: self.lambda_authorizer_config.or(lambda),
            additional_authentication_providers: self
                .additional_authentication_providers
                .or(fallback.additional_authentication_providers),
            xray_enabled: self.xray_enabled.or(fallback.xray_enabled),
            log_config: self.log_config.or(fallback.log_config),
            tags: self.tags.or(fallback.tags),
        }
    }

    pub fn resolve(self) -> ApiSettings {
        ApiSettings {
            name: self.name.unwrap_or_default(),
            authentication_type: self.authentication_type.unwrap_or_default(),
            user_pool_config: self.user_pool_config,
            open_id_connect_config: self.open_id_connect_config,
            lambda_authorizer_config: self.lambda_authorizer_config,
            additional_authentication_providers: self
                .additional_authentication_providers
                .unwrap_or_default(),
            xray_enabled: self.xray_enabled.unwrap_or_default(),
            log_config: self.log_config,
            tags: self.tags.unwrap_or_default(),
        }
    }
}

/// Resolves the settings to apply: explicit values win over the prior
/// deployment's, which win over `defaults`.
pub fn apply_overrides(
    explicit: &DesiredConfig,
    prior: Option<&ApiSettings>,
    defaults: &ApiSettings,
) -> ApiSettings {
    let mut layered = PartialApiSettings::from_desired(explicit);
    if let Some(prior) = prior {
        layered = layered.or(PartialApiSettings::from_settings(prior));
    }
    layered
        .or(PartialApiSettings::from_settings(defaults))
        .resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_pool() -> UserPoolConfig {
        UserPoolConfig {
            user_pool_id: "us-east-1_abc".to_string(),
            aws_region: "us-east-1".to_string(),
            default_action: Some("ALLOW".to_string()),
            app_id_client_regex: None,
        }
    }

    #[test]
    fn test_explicit_wins() {
        let explicit = DesiredConfig {
            name: Some("explicit".to_string()),
            xray_enabled: Some(true),
            ..Default::default()
        };
        let prior = ApiSettings {
            name: "prior".to_string(),
            authentication_type: AuthenticationType::AwsIam,
            ..Default::default()
        };

        let resolved = apply_overrides(&explicit, Some(&prior), &ApiSettings::default());
        assert_eq!(resolved.name, "explicit");
        assert!(resolved.xray_enabled);
        assert_eq!(resolved.authentication_type, AuthenticationType::AwsIam);
    }

    #[test]
    fn test_prior_then_defaults() {
        let defaults = ApiSettings {
            name: "default-name".to_string(),
            ..Default::default()
        };

        let resolved = apply_overrides(&DesiredConfig::default(), None, &defaults);
        assert_eq!(resolved.name, "default-name");
        assert_eq!(resolved.authentication_type, AuthenticationType::ApiKey);

        let prior = ApiSettings {
            name: "prior".to_string(),
            ..Default::default()
        };
        let resolved = apply_overrides(&DesiredConfig::default(), Some(&prior), &defaults);
        assert_eq!(resolved.name, "prior");
    }

    #[test]
    fn test_switching_auth_drops_prior_blocks() {
        let prior = ApiSettings {
            name: "blog".to_string(),
            authentication_type: AuthenticationType::AmazonCognitoUserPools,
            user_pool_config: Some(user_pool()),
            ..Default::default()
        };

        let same = apply_overrides(&DesiredConfig::default(), Some(&prior), &ApiSettings::default());
        assert_eq!(same.user_pool_config, Some(user_pool()));

        let switched = DesiredConfig {
            authentication_type: Some(AuthenticationType::ApiKey),
            ..Default::default()
        };
        let resolved = apply_overrides(&switched, Some(&prior), &ApiSettings::default());
        assert_eq!(resolved.authentication_type, AuthenticationType::ApiKey);
        assert!(resolved.user_pool_config.is_none());
        assert!(resolved.validate().is_ok());
    }
}
