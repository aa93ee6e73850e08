//! Resolution of file-backed template and schema text.

use std::path::{Path, PathBuf};

use crate::error::ProviderError;

/// Turns a field that holds either literal text or a file path into text.
pub trait TemplateSource: Send + Sync {
    /// Returns the file contents when `path_or_text` names a readable file,
    /// otherwise `path_or_text` unchanged.
    fn read_if_file(&self, path_or_text: &str) -> Result<String, ProviderError>;

    fn read_opt(&self, value: Option<&str>) -> Result<Option<String>, ProviderError> {
        value.map(|v| self.read_if_file(v)).transpose()
    }
}

/// Reads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsTemplateSource {
    fn default() -> Self {
        Self::new(".")
    }
}

impl TemplateSource for FsTemplateSource {
    fn read_if_file(&self, path_or_text: &str) -> Result<String, ProviderError> {
        // Literal SDL and mapping templates span lines; paths never do.
        if path_or_text.contains('\n') || path_or_text.trim().is_empty() {
            return Ok(path_or_text.to_string());
        }
        let path = self.root.join(path_or_text);
        if !path.is_file() {
            return Ok(path_or_text.to_string());
        }
        tracing::debug!(path = %path.display(), "reading template file");
        std::fs::read_to_string(&path).map_err(|source| ProviderError::Template {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_file_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("request.vtl"), "$util.toJson($ctx.args)").unwrap();

        let source = FsTemplateSource::new(dir.path());
        assert_eq!(
            source.read_if_file("request.vtl").unwrap(),
            "$util.toJson($ctx.args)"
        );
    }

    #[test]
    fn test_returns_literal_text_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTemplateSource::new(dir.path());

        assert_eq!(source.read_if_file("missing.vtl").unwrap(), "missing.vtl");
        let sdl = "type Query {\n  hello: String\n}";
        assert_eq!(source.read_if_file(sdl).unwrap(), sdl);
    }

    #[test]
    fn test_read_opt() {
        let source = FsTemplateSource::default();
        assert_eq!(source.read_opt(None).unwrap(), None);
        assert_eq!(
            source.read_opt(Some("{}")).unwrap().as_deref(),
            Some("{}")
        );
    }
}
