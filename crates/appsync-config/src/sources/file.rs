//! File-based configuration source

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ConfigError;
use crate::merger::{PartialConfig, Priority};
use crate::sources::ConfigSource;

/// Document format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// File-based configuration source
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Source whose file must exist
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// Source that yields an empty config when the file is missing
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the configuration file
    fn read_config(&self) -> Result<PartialConfig, ConfigError> {
        let path = &self.path;

        if !self.required && !path.exists() {
            debug!("Config file does not exist: {:?}", path);
            return Ok(PartialConfig::new());
        }

        let content = std::fs::read_to_string(path)?;

        match Format::for_path(path) {
            Format::Toml => PartialConfig::from_toml(&content),
            Format::Json => {
                let value = serde_json::from_str(&content)
                    .map_err(|e| ConfigError::parse(format!("JSON parse error: {e}")))?;
                PartialConfig::from_json(value)
            }
        }
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn priority(&self) -> Priority {
        Priority::File
    }

    fn load(&self) -> Result<PartialConfig, ConfigError> {
        self.read_config()
    }
}
