// src/config.rs

//! Run configuration.
//!
//! Values come from an optional TOML file and from the command line, the
//! command line (including its environment fallbacks) taking priority:
//!
//! ```toml
//! repo = "scottyab/rootbeer"
//! tokens = ["github_pat_..."]
//! api_base = "https://api.github.com"
//! per_page = 100
//! max_pages = 50
//! data_dir = "data"
//! ```

use crate::collector::{CollectorConfig, MAX_PER_PAGE};
use crate::error::ConfigError;
use crate::github::{TokenPool, DEFAULT_API_BASE};
use crate::model::RepoId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "file-touches.toml";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Repository in `owner/name` form
    pub repo: Option<String>,
    #[serde(default)]
    pub tokens: Vec<String>,
    pub api_base: Option<String>,
    pub per_page: Option<u32>,
    pub max_pages: Option<u32>,
    pub data_dir: Option<PathBuf>,
}

/// Everything the collector needs, validated
#[derive(Debug)]
pub struct CollectSettings {
    pub tokens: TokenPool,
    pub api_base: String,
    pub collector: CollectorConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Loads `explicit` if given, otherwise `file-touches.toml` in the
    /// working directory when present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Config) {
        if other.repo.is_some() {
            self.repo = other.repo;
        }
        if !other.tokens.is_empty() {
            self.tokens = other.tokens;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.per_page.is_some() {
            self.per_page = other.per_page;
        }
        if other.max_pages.is_some() {
            self.max_pages = other.max_pages;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
    }

    pub fn repo(&self) -> Result<RepoId, ConfigError> {
        self.repo.as_deref().ok_or(ConfigError::MissingRepo)?.parse()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    pub fn collect_settings(&self) -> Result<CollectSettings, ConfigError> {
        let repo = self.repo()?;
        let tokens = TokenPool::new(self.tokens.iter().map(String::as_str))?;

        let per_page = self.per_page.unwrap_or(MAX_PER_PAGE);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage(per_page));
        }

        Ok(CollectSettings {
            tokens,
            api_base: self
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            collector: CollectorConfig {
                per_page,
                max_pages: self.max_pages,
                ..CollectorConfig::new(repo)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file-touches.toml");
        fs::write(
            &path,
            r#"
repo = "scottyab/rootbeer"
tokens = ["a", "b"]
max_pages = 3
"#,
        )
        .unwrap();

        let config = Config::discover(Some(&path)).unwrap();
        let settings = config.collect_settings().unwrap();
        assert_eq!(settings.collector.repo.name, "rootbeer");
        assert_eq!(settings.collector.per_page, 100);
        assert_eq!(settings.collector.max_pages, Some(3));
        assert_eq!(settings.tokens.len(), 2);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(config.data_dir(), PathBuf::from("data"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "repository = \"o/r\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::discover(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn command_line_overrides_file() {
        let mut config = Config {
            repo: Some("o/file".to_string()),
            tokens: vec!["from-file".to_string()],
            per_page: Some(50),
            ..Default::default()
        };
        config.merge(Config {
            repo: Some("o/cli".to_string()),
            tokens: vec!["from-cli".to_string()],
            ..Default::default()
        });

        assert_eq!(config.repo().unwrap().name, "cli");
        assert_eq!(config.tokens, vec!["from-cli"]);
        assert_eq!(config.per_page, Some(50));
    }

    #[test]
    fn collect_settings_validate_inputs() {
        let no_repo = Config {
            tokens: vec!["t".to_string()],
            ..Default::default()
        };
        assert!(matches!(no_repo.collect_settings(), Err(ConfigError::MissingRepo)));

        let no_tokens = Config {
            repo: Some("o/r".to_string()),
            ..Default::default()
        };
        assert!(matches!(no_tokens.collect_settings(), Err(ConfigError::NoTokens)));

        let bad_page = Config {
            repo: Some("o/r".to_string()),
            tokens: vec!["t".to_string()],
            per_page: Some(500),
            ..Default::default()
        };
        assert!(matches!(
            bad_page.collect_settings(),
            Err(ConfigError::InvalidPerPage(500))
        ));
    }
}
