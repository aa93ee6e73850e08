use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, Result};

// search-<domain>-<id>.<region>.es.amazonaws.com
static ES_ENDPOINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?search-(?P<domain>[a-z][a-z0-9\-]*)-[a-z0-9]+\.(?P<region>[a-z]{2}(?:-[a-z]+)+-\d)\.es\.amazonaws\.com/?$",
    )
    .expect("Invalid Elasticsearch endpoint regex")
});

/// Domain name and region encoded in an Elasticsearch service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchDomain {
    pub domain: String,
    pub region: String,
}

pub fn parse_elasticsearch_endpoint(endpoint: &str) -> Result<ElasticsearchDomain> {
    let captures = ES_ENDPOINT_REGEX
        .captures(endpoint.trim())
        .ok_or_else(|| CoreError::invalid_endpoint(endpoint))?;
    Ok(ElasticsearchDomain {
        domain: captures["domain"].to_string(),
        region: captures["region"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let parsed = parse_elasticsearch_endpoint(
            "https://search-blog-posts-3kz7x2ab9mfqxk.eu-central-1.es.amazonaws.com",
        )
        .unwrap();
        assert_eq!(parsed.domain, "blog-posts");
        assert_eq!(parsed.region, "eu-central-1");
    }

    #[test]
    fn test_parse_endpoint_without_scheme() {
        let parsed =
            parse_elasticsearch_endpoint("search-logs-abc123.us-east-1.es.amazonaws.com/").unwrap();
        assert_eq!(parsed.domain, "logs");
        assert_eq!(parsed.region, "us-east-1");
    }

    #[test]
    fn test_unrecognized_endpoint_is_a_configuration_error() {
        let err = parse_elasticsearch_endpoint("https://search.example.com").unwrap_err();
        assert!(matches!(err, CoreError::InvalidEndpoint(_)));
        assert!(err.is_configuration_error());
    }
}
