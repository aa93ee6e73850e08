//! Assembles a desired configuration from its sources.

use std::path::{Path, PathBuf};

use appsync_core::DesiredConfig;
use tracing::{debug, info};

use crate::merger::{MergedConfig, Priority};
use crate::options::SyncOptions;
use crate::sources::{ConfigSource, EnvSource, FileSource};
use crate::{ConfigError, Result};

/// A validated desired configuration plus engine options.
///
/// A relative `options.template_root` has already been resolved against
/// the configuration file's directory.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub desired: DesiredConfig,
    pub options: SyncOptions,
    /// Directory of the configuration file, if one was loaded.
    pub base_dir: Option<PathBuf>,
}

/// Builder over an ordered set of configuration sources.
#[derive(Default)]
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
    base_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required configuration file.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.base_dir = path.parent().map(Path::to_path_buf);
        self.sources.push(Box::new(FileSource::from_path(path)));
        self
    }

    /// Adds `APPSYNC__*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_source(EnvSource::from_env())
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn load(&self) -> Result<LoadedConfig> {
        let mut merged = MergedConfig::defaults();

        let mut ordered: Vec<&dyn ConfigSource> =
            self.sources.iter().map(|source| source.as_ref()).collect();
        ordered.sort_by_key(|source| source.priority());

        for source in ordered {
            let partial = source.load()?;
            debug!(
                source = source.name(),
                keys = partial.keys().count(),
                "loaded configuration source"
            );
            merged.merge(partial, source.priority());
        }

        merged.validate()?;
        let desired: DesiredConfig = merged.deserialize()?;
        let mut options: SyncOptions = merged.deserialize_section("sync")?;
        options.validate()?;
        if let Some(base) = &self.base_dir
            && options.template_root.is_relative()
        {
            options.template_root = base.join(&options.template_root);
        }
        desired.preflight().map_err(ConfigError::from)?;

        info!(
            name = desired.name.as_deref().unwrap_or("<unnamed>"),
            data_sources = desired.data_sources.len(),
            resolvers = desired.resolvers.len(),
            functions = desired.functions.len(),
            api_keys = desired.api_keys.len(),
            name_source = ?merged.get_source("name").unwrap_or(Priority::Default),
            "Configuration loaded"
        );

        Ok(LoadedConfig {
            desired,
            options,
            base_dir: self.base_dir.clone(),
        })
    }
}

/// Loads `path` with environment overrides applied on top.
pub fn load_desired_config(path: impl AsRef<Path>) -> Result<LoadedConfig> {
    ConfigLoader::new().with_file(path).with_env().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::PartialConfig;
    use appsync_core::DataSourceType;

    const DOCUMENT: &str = r#"
name = "blog"
schema = "schema.graphql"
apiKeys = ["public"]

[[dataSources]]
name = "posts"
type = "AMAZON_DYNAMODB"
config = { tableName = "Posts" }

[[resolvers]]
typeName = "Query"
fieldName = "getPost"
dataSourceName = "posts"
requestMappingTemplate = "templates/getPost.request.vtl"

[sync]
pollIntervalMs = 200
templateRoot = "templates-root"
"#;

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("appsync.toml");
        std::fs::write(&path, DOCUMENT).unwrap();
        path
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path());

        let loaded = ConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(loaded.desired.name.as_deref(), Some("blog"));
        assert_eq!(loaded.desired.data_sources.len(), 1);
        assert_eq!(
            loaded.desired.data_sources[0].kind(),
            DataSourceType::AmazonDynamodb
        );
        assert_eq!(loaded.desired.api_keys.len(), 1);
        assert_eq!(loaded.options.poll_interval_ms, 200);
        assert_eq!(loaded.options.max_poll_attempts, 300);
        assert_eq!(
            loaded.options.template_root,
            dir.path().join("templates-root")
        );
    }

    #[test]
    fn test_default_template_root_is_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsync.toml");
        std::fs::write(&path, "name = \"blog\"\nschema = \"schema.graphql\"\n").unwrap();

        let loaded = ConfigLoader::new().with_file(&path).load().unwrap();
        assert!(loaded.options.template_root.starts_with(dir.path()));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path());

        let loaded = ConfigLoader::new()
            .with_source(EnvSource::from_vars([
                ("APPSYNC__NAME", "blog-staging"),
                ("APPSYNC__SYNC__MAX_POLL_ATTEMPTS", "10"),
            ]))
            .with_file(&path)
            .load()
            .unwrap();

        assert_eq!(loaded.desired.name.as_deref(), Some("blog-staging"));
        assert_eq!(loaded.options.max_poll_attempts, 10);
        assert_eq!(loaded.options.poll_interval_ms, 200);
    }

    #[test]
    fn test_numeric_looking_env_name_loads_as_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path());

        let loaded = ConfigLoader::new()
            .with_file(&path)
            .with_source(EnvSource::from_vars([("APPSYNC__NAME", "2024")]))
            .load()
            .unwrap();
        assert_eq!(loaded.desired.name.as_deref(), Some("2024"));
    }

    #[test]
    fn test_explicit_overrides_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path());
        let explicit =
            PartialConfig::from_json(serde_json::json!({ "name": "from-caller" })).unwrap();

        let loaded = ConfigLoader::new()
            .with_file(&path)
            .with_source(explicit)
            .with_source(EnvSource::from_vars([("APPSYNC__NAME", "from-env")]))
            .load()
            .unwrap();
        assert_eq!(loaded.desired.name.as_deref(), Some("from-caller"));
    }

    #[test]
    fn test_duplicate_resources_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appsync.json");
        std::fs::write(
            &path,
            r#"{"name": "blog", "apiKeys": ["a", "a"]}"#,
        )
        .unwrap();

        let err = ConfigLoader::new().with_file(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_desired_config(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
