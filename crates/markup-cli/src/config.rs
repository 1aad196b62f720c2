//! `.markuprc.toml` discovery and loading

use anyhow::{Context, Result, bail};
use markup_core::{DEFAULT_MAX_DEPTH, DocumentationMode, ParseOptions, SourceKind};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".markuprc.toml";

/// Settings read from `.markuprc.toml`
///
/// ```toml
/// [parser]
/// source-kind = "script"
/// documentation-mode = "none"
/// max-depth = 256
///
/// [files]
/// extensions = ["xml", "xaml"]
/// exclude = ["bin", "obj"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkupConfig {
    pub parser: ParserConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParserConfig {
    pub source_kind: SourceKind,
    pub documentation_mode: DocumentationMode,
    pub max_depth: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            source_kind: SourceKind::default(),
            documentation_mode: DocumentationMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Extensions picked up when walking directories, without the dot
    pub extensions: Vec<String>,
    /// Directory or file names skipped when walking directories
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: ["xml", "xaml", "axaml"].map(String::from).to_vec(),
            exclude: Vec::new(),
        }
    }
}

impl MarkupConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_source_kind(self.parser.source_kind)
            .with_documentation_mode(self.parser.documentation_mode)
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.files
                    .extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.files.exclude.iter().any(|excluded| excluded == name))
    }
}

/// Finds and reads configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Walks upward from `start_path` to the filesystem root looking for
    /// `.markuprc.toml`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .with_context(|| format!("Invalid path: {}", start_path.display()))?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                debug!("Found config: {}", config_path.display());
                return Ok(Some(config_path));
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<MarkupConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from '{}'", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from '{}'", path.display()))
    }

    /// Explicit path if given, otherwise the discovered file, otherwise defaults
    pub fn load(custom_path: Option<&Path>, start_dir: &Path) -> Result<MarkupConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::load_from_file(path);
        }
        match Self::auto_discover(start_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No {CONFIG_FILE_NAME} found, using defaults");
                Ok(MarkupConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[parser]
source-kind = "script"
documentation-mode = "none"
max-depth = 64

[files]
extensions = ["xaml"]
exclude = ["obj"]
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.parser.source_kind, SourceKind::Script);
        assert_eq!(config.parser.documentation_mode, DocumentationMode::None);
        assert_eq!(config.parser.max_depth, 64);
        assert_eq!(config.files.extensions, vec!["xaml"]);
        assert!(config.is_excluded(Path::new("src/obj")));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: MarkupConfig = toml::from_str("[parser]\nmax-depth = 8\n").unwrap();
        assert_eq!(config.parser.max_depth, 8);
        assert_eq!(config.parser.source_kind, SourceKind::Regular);
        assert!(config.matches_extension(Path::new("a/Window.XAML")));
        assert!(!config.matches_extension(Path::new("a/notes.txt")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<MarkupConfig>("[parser]\nstrict = true\n").is_err());
    }

    #[test]
    fn test_auto_discover_walks_upward() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert_eq!(found, temp_dir.path().canonicalize().unwrap().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(ConfigLoader::load(Some(&missing), temp_dir.path()).is_err());
    }
}
