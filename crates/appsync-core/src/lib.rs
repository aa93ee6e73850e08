pub mod api;
pub mod arn;
pub mod checksum;
pub mod desired;
pub mod diff;
pub mod endpoint;
pub mod error;
pub mod expiry;
pub mod plan;
pub mod resources;
pub mod state;

pub use api::{
    AdditionalAuthenticationProvider, ApiSettings, AuthenticationType, FieldLogLevel,
    LambdaAuthorizerConfig, LogConfig, OpenIdConnectConfig, UserPoolConfig,
};
pub use arn::Arn;
pub use checksum::checksum;
pub use desired::DesiredConfig;
pub use diff::{
    OneOrMany, deserialize_list, duplicate_check, keyed_equals, normalize_list, set_difference,
};
pub use endpoint::{ElasticsearchDomain, parse_elasticsearch_endpoint};
pub use error::{CoreError, ErrorCategory, Result};
pub use expiry::{Expiry, normalize_expiry};
pub use plan::{Applied, Change, Mode, PlannedAction, RemoteRecord, ResourceKind, plan_actions};
pub use resources::{
    ApiKeySpec, DataSourceConfig, DataSourceSpec, DataSourceType, DynamoDbConfig,
    ElasticsearchConfig, FunctionSpec, HttpConfig, LambdaConfig, PipelineConfig,
    RelationalDatabaseConfig, ResolverKind, ResolverSpec,
};
pub use state::{
    ApiKeyState, ApiState, DataSourceState, FunctionState, ResolverState, RoleState, SyncState,
};
