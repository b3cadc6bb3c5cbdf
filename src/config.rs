use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rerank::DEFAULT_MAX_CANDIDATES;
use crate::semantic::{IndexPreference, DEFAULT_MODEL};

const CONFIG_FILE: &str = "config.yaml";
const CATALOG_FILE: &str = "catalog.jsonl";

/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

const DEFAULT_RERANK_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_RERANK_API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_RERANK_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_RERANK_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the sentence encoder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

/// Configuration for the external relevance reranker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Rerank when the credential is present
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_rerank_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_rerank_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_rerank_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_rerank_timeout_secs")]
    pub timeout_secs: u64,

    /// How many of the top candidates are sent for scoring
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_RERANK_MODEL.to_string(),
            api_key_env: DEFAULT_RERANK_API_KEY_ENV.to_string(),
            endpoint: DEFAULT_RERANK_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_RERANK_TIMEOUT_SECS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_embedding_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_rerank_model() -> String {
    DEFAULT_RERANK_MODEL.to_string()
}

fn default_rerank_api_key_env() -> String {
    DEFAULT_RERANK_API_KEY_ENV.to_string()
}

fn default_rerank_endpoint() -> String {
    DEFAULT_RERANK_ENDPOINT.to_string()
}

fn default_rerank_timeout_secs() -> u64 {
    DEFAULT_RERANK_TIMEOUT_SECS
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog file; relative paths are resolved against the base directory
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexPreference,
    #[serde(default)]
    pub rerank: RerankConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "embedding.model must not be empty".to_string(),
            ));
        }

        if self.embedding.download_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "embedding.download_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let rerank = &self.rerank;
        if rerank.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "rerank.model must not be empty".to_string(),
            ));
        }

        if rerank.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "rerank.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if rerank.max_candidates == 0 {
            return Err(ConfigError::Invalid(
                "rerank.max_candidates must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, writing defaults if missing.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            std::fs::create_dir_all(base_path)?;
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)?;
            log::info!("wrote default config to {}", path.display());
        }

        let config_str = std::fs::read_to_string(&path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    /// Use a catalog path given on the command line.
    ///
    /// Relative paths are taken from the current directory, not the base
    /// directory.
    pub fn override_catalog_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        self.catalog_path = Some(path);
        Ok(())
    }

    /// Resolved catalog location.
    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.base_path.join(path),
            None => self.base_path.join(CATALOG_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.index, IndexPreference::Auto);
        assert!(config.rerank.enabled);
        assert_eq!(config.rerank.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.rerank.max_candidates, 30);
        assert_eq!(config.catalog_path(), dir.path().join("catalog.jsonl"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "index: brute-force\nrerank:\n  enabled: false\ncatalog_path: data/items.jsonl\n",
        )
        .unwrap();

        let config = Config::load_with(dir.path()).unwrap();
        assert_eq!(config.index, IndexPreference::BruteForce);
        assert!(!config.rerank.enabled);
        assert_eq!(config.rerank.timeout_secs, 15);
        assert_eq!(config.embedding.download_timeout_secs, 300);
        assert_eq!(
            config.catalog_path(),
            dir.path().join("data").join("items.jsonl")
        );
    }

    #[test]
    fn test_absolute_catalog_path_kept() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("elsewhere.jsonl");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            format!("catalog_path: {}\n", catalog.display()),
        )
        .unwrap();

        let config = Config::load_with(dir.path()).unwrap();
        assert_eq!(config.catalog_path(), catalog);
    }

    #[test]
    fn test_catalog_override_relative_to_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with(dir.path()).unwrap();

        config
            .override_catalog_path(Path::new("data/items.jsonl"))
            .unwrap();

        let expected = std::env::current_dir().unwrap().join("data/items.jsonl");
        assert_eq!(config.catalog_path(), expected);
        assert!(!config.catalog_path().starts_with(dir.path()));
    }

    #[test]
    fn test_catalog_override_absolute_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_with(dir.path()).unwrap();
        let catalog = dir.path().join("other").join("items.jsonl");

        config.override_catalog_path(&catalog).unwrap();
        assert_eq!(config.catalog_path(), catalog);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "rerank:\n  timeout_secs: 0\n").unwrap();

        let result = Config::load_with(dir.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_index_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "index: hnsw\n").unwrap();

        let result = Config::load_with(dir.path());
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }
}
