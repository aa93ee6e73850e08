//! Inline policy synthesized for the API's service role.

use appsync_core::{
    Arn, CoreError, DataSourceConfig, DataSourceSpec, parse_elasticsearch_endpoint,
};
use serde::Serialize;

pub const POLICY_VERSION: &str = "2012-10-17";

const LAMBDA_ACTIONS: &[&str] = &["lambda:invokeFunction"];

const DYNAMODB_ACTIONS: &[&str] = &[
    "dynamodb:DeleteItem",
    "dynamodb:GetItem",
    "dynamodb:PutItem",
    "dynamodb:Query",
    "dynamodb:Scan",
    "dynamodb:UpdateItem",
    "dynamodb:BatchGetItem",
    "dynamodb:BatchWriteItem",
];

const ELASTICSEARCH_ACTIONS: &[&str] = &[
    "es:ESHttpDelete",
    "es:ESHttpGet",
    "es:ESHttpHead",
    "es:ESHttpPost",
    "es:ESHttpPut",
];

const RDS_DATA_ACTIONS: &[&str] = &[
    "rds-data:DeleteItems",
    "rds-data:ExecuteSql",
    "rds-data:ExecuteStatement",
    "rds-data:GetItems",
    "rds-data:InsertItems",
    "rds-data:UpdateItems",
];

const SECRETS_ACTIONS: &[&str] = &["secretsmanager:GetSecretValue"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: String,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

impl PolicyStatement {
    fn allow(actions: &[&str], resource: Vec<String>) -> Self {
        Self {
            effect: "Allow".to_string(),
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Compact JSON, the form that is uploaded and checksummed.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Trust policy letting the GraphQL service assume the role.
pub fn assume_role_policy() -> String {
    serde_json::json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"Service": "appsync.amazonaws.com"},
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Builds the least-privilege policy for every data source that relies on
/// the synthesized role.
///
/// One statement is emitted per backend kind in use. Regions default to the
/// API's own region. Returns `None` when no data source needs the role.
pub fn synthesize_policy(
    data_sources: &[DataSourceSpec],
    api_arn: &Arn,
) -> Result<Option<PolicyDocument>, CoreError> {
    let mut lambda = Vec::new();
    let mut dynamodb = Vec::new();
    let mut elasticsearch = Vec::new();
    let mut rds = Vec::new();
    let mut secrets = Vec::new();

    let partition = &api_arn.partition;
    let account = &api_arn.account_id;
    let region_or_api = |region: &Option<String>| -> String {
        region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(&api_arn.region)
            .to_string()
    };

    for data_source in data_sources.iter().filter(|ds| ds.needs_synthesized_role()) {
        match &data_source.config {
            DataSourceConfig::AwsLambda(config) => {
                let arn = &config.lambda_function_arn;
                lambda.push(arn.clone());
                lambda.push(format!("{arn}:*"));
            }
            DataSourceConfig::AmazonDynamodb(config) => {
                let region = region_or_api(&config.aws_region);
                let table = format!(
                    "arn:{partition}:dynamodb:{region}:{account}:table/{}",
                    config.table_name
                );
                let items = format!("{table}/*");
                dynamodb.extend([table, items]);
            }
            DataSourceConfig::AmazonElasticsearch(config) => {
                let domain = parse_elasticsearch_endpoint(&config.endpoint)?;
                elasticsearch.push(format!(
                    "arn:{partition}:es:{}:{account}:domain/{}/*",
                    domain.region, domain.domain
                ));
            }
            DataSourceConfig::RelationalDatabase(config) => {
                let region = region_or_api(&config.aws_region);
                let cluster = format!(
                    "arn:{partition}:rds:{region}:{account}:cluster:{}",
                    config.db_cluster_identifier
                );
                rds.push(cluster.clone());
                rds.push(format!("{cluster}:*"));
                let secret = &config.aws_secret_store_arn;
                secrets.push(secret.clone());
                secrets.push(format!("{secret}:*"));
            }
            DataSourceConfig::Http(_) | DataSourceConfig::None => {}
        }
    }

    let statement: Vec<PolicyStatement> = [
        (LAMBDA_ACTIONS, lambda),
        (DYNAMODB_ACTIONS, dynamodb),
        (ELASTICSEARCH_ACTIONS, elasticsearch),
        (RDS_DATA_ACTIONS, rds),
        (SECRETS_ACTIONS, secrets),
    ]
    .into_iter()
    .filter(|(_, resources)| !resources.is_empty())
    .map(|(actions, resources)| PolicyStatement::allow(actions, resources))
    .collect();

    if statement.is_empty() {
        return Ok(None);
    }
    Ok(Some(PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_arn() -> Arn {
        Arn::parse("arn:aws:appsync:eu-west-1:123456789012:apis/abc").unwrap()
    }

    fn spec(value: serde_json::Value) -> DataSourceSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lambda_single_statement() {
        let lambda = spec(json!({
            "name": "A",
            "type": "AWS_LAMBDA",
            "config": {"lambdaFunctionArn": "arn:aws:lambda:eu-west-1:123456789012:function:f"}
        }));
        let policy = synthesize_policy(&[lambda], &api_arn()).unwrap().unwrap();

        assert_eq!(policy.statement.len(), 1);
        assert_eq!(policy.statement[0].action, vec!["lambda:invokeFunction"]);
        assert_eq!(
            policy.statement[0].resource,
            vec![
                "arn:aws:lambda:eu-west-1:123456789012:function:f",
                "arn:aws:lambda:eu-west-1:123456789012:function:f:*",
            ]
        );

        let value: serde_json::Value = serde_json::from_str(&policy.to_json().unwrap()).unwrap();
        assert_eq!(value["Version"], "2012-10-17");
        assert_eq!(value["Statement"][0]["Effect"], "Allow");
    }

    #[test]
    fn test_statements_grouped_by_kind() {
        let sources = [
            spec(json!({"name": "t1", "type": "AMAZON_DYNAMODB", "config": {"tableName": "posts"}})),
            spec(json!({
                "name": "t2",
                "type": "AMAZON_DYNAMODB",
                "config": {"tableName": "comments", "awsRegion": "us-west-2"}
            })),
            spec(json!({
                "name": "search",
                "type": "AMAZON_ELASTICSEARCH",
                "config": {"endpoint": "https://search-blog-abc123.us-east-1.es.amazonaws.com"}
            })),
            spec(json!({
                "name": "db",
                "type": "RELATIONAL_DATABASE",
                "config": {
                    "dbClusterIdentifier": "blog-cluster",
                    "awsSecretStoreArn": "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db"
                }
            })),
        ];
        let policy = synthesize_policy(&sources, &api_arn()).unwrap().unwrap();
        assert_eq!(policy.statement.len(), 4);

        assert_eq!(
            policy.statement[0].resource,
            vec![
                "arn:aws:dynamodb:eu-west-1:123456789012:table/posts",
                "arn:aws:dynamodb:eu-west-1:123456789012:table/posts/*",
                "arn:aws:dynamodb:us-west-2:123456789012:table/comments",
                "arn:aws:dynamodb:us-west-2:123456789012:table/comments/*",
            ]
        );
        assert_eq!(
            policy.statement[1].resource,
            vec!["arn:aws:es:us-east-1:123456789012:domain/blog/*"]
        );
        assert_eq!(
            policy.statement[2].resource,
            vec![
                "arn:aws:rds:eu-west-1:123456789012:cluster:blog-cluster",
                "arn:aws:rds:eu-west-1:123456789012:cluster:blog-cluster:*",
            ]
        );
        assert_eq!(policy.statement[3].action, vec!["secretsmanager:GetSecretValue"]);
    }

    #[test]
    fn test_no_policy_when_roles_are_explicit() {
        let sources = [
            spec(json!({
                "name": "A",
                "type": "AWS_LAMBDA",
                "serviceRoleArn": "arn:aws:iam::123456789012:role/own",
                "config": {"lambdaFunctionArn": "arn:aws:lambda:eu-west-1:123456789012:function:f"}
            })),
            spec(json!({"name": "B", "type": "NONE"})),
            spec(json!({"name": "C", "type": "HTTP", "config": {"endpoint": "https://example.com"}})),
        ];
        assert_eq!(synthesize_policy(&sources, &api_arn()).unwrap(), None);
    }

    #[test]
    fn test_unrecognized_elasticsearch_endpoint() {
        let source = spec(json!({
            "name": "search",
            "type": "AMAZON_ELASTICSEARCH",
            "config": {"endpoint": "https://search.example.com"}
        }));
        let err = synthesize_policy(&[source], &api_arn()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_assume_role_policy_trusts_service() {
        let value: serde_json::Value = serde_json::from_str(&assume_role_policy()).unwrap();
        assert_eq!(
            value["Statement"][0]["Principal"]["Service"],
            "appsync.amazonaws.com"
        );
    }
}
