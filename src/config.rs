use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHARSET: &str = "UTF-8";

/// Settings of an assembly session.
///
/// Loaded from a `.yaml`/`.yml` or `.json` file. Every field has a default, so an empty
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssemblyConfig {
    /// Resources must resolve under this directory.
    pub base_directory: PathBuf,
    pub source_charset: String,
    pub rendering_charset: String,
    /// Threads loading files. Defaults to the available parallelism.
    pub worker_count: Option<usize>,
    /// Extensions of the files an `insert` on a directory picks.
    pub novella_extensions: Vec<String>,
    /// When not empty, only content carrying one of these tags is kept.
    pub tags: Vec<String>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        AssemblyConfig {
            base_directory: PathBuf::from("."),
            source_charset: DEFAULT_CHARSET.to_string(),
            rendering_charset: DEFAULT_CHARSET.to_string(),
            worker_count: None,
            novella_extensions: vec!["novella".to_string(), "nlp".to_string()],
            tags: Vec::new(),
        }
    }
}

impl AssemblyConfig {
    pub fn with_base_directory(base_directory: impl Into<PathBuf>) -> Self {
        AssemblyConfig {
            base_directory: base_directory.into(),
            ..AssemblyConfig::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a configuration file, picking the format from its extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        let content = || {
            fs::read_to_string(path).map_err(|err| ConfigError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
        };
        let malformed = |message: String| ConfigError::Malformed {
            path: path.to_path_buf(),
            message,
        };
        match extension.as_deref() {
            Some("yaml" | "yml") => {
                Self::from_yaml(&content()?).map_err(|err| malformed(err.to_string()))
            }
            Some("json") => Self::from_json(&content()?).map_err(|err| malformed(err.to_string())),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        assert_eq!(
            AssemblyConfig::from_json("{}").unwrap(),
            AssemblyConfig::default()
        );
    }

    #[test]
    fn test_yaml_fields() {
        let config = AssemblyConfig::from_yaml(
            "base-directory: /books\nworker-count: 2\ntags: [draft, final]\n",
        )
        .unwrap();
        assert_eq!(config.base_directory, PathBuf::from("/books"));
        assert_eq!(config.worker_count, Some(2));
        assert_eq!(config.tags, vec!["draft", "final"]);
        assert_eq!(config.source_charset, DEFAULT_CHARSET);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AssemblyConfig::with_base_directory("/b");
        assert_eq!(
            AssemblyConfig::from_yaml(&config.to_yaml().unwrap()).unwrap(),
            config
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("session.json");
        fs::write(&json, r#"{"novella-extensions": ["txt"]}"#).unwrap();
        assert_eq!(
            AssemblyConfig::from_file(&json).unwrap().novella_extensions,
            vec!["txt"]
        );

        let toml = dir.path().join("session.toml");
        assert!(matches!(
            AssemblyConfig::from_file(&toml),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "worker-count: many").unwrap();
        assert!(matches!(
            AssemblyConfig::from_file(&broken),
            Err(ConfigError::Malformed { .. })
        ));
    }
}
