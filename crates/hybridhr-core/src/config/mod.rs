//! Configuration management
//!
//! Every tunable used at query time lives here and is handed to each
//! component's constructor as an immutable value.

use crate::error::{HybridError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Path to the SQLite record/vector store
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Retriever limits and thresholds
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Confidence scoring constants
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Context assembly budget
    #[serde(default)]
    pub context: ContextConfig,

    /// Classifier vocabulary
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings; must match the model the indices were built with
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature for answer generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens generated per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("HYBRIDHR_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("HYBRIDHR_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("HYBRIDHR_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("HYBRIDHR_LLM_API_KEY").ok(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("HYBRIDHR_LLM_MODEL")
        .unwrap_or_else(|_| "meta-llama/Llama-3.1-8B-Instruct".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("HYBRIDHR_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout() -> u64 {
    30
}

/// Retriever limits and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbours requested per domain index
    pub top_k: usize,
    /// Minimum similarity for a semantic hit to be kept
    pub similarity_threshold: f64,
    /// Hard cap on records returned by an aggregate filter
    pub structured_limit: usize,
    /// Items kept after merging
    pub max_results: usize,
    /// Per-call timeout for gateway, embedding and completion calls
    ///
    /// Each completion attempt gets this bound; `llm_service.timeout_secs`
    /// only caps the underlying HTTP request.
    pub call_timeout_secs: u64,
    /// Run semantic retrieval when a structured-routed query finds no records
    pub semantic_fallback: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.3,
            structured_limit: 20,
            max_results: 5,
            call_timeout_secs: 10,
            semantic_fallback: true,
        }
    }
}

impl RetrievalConfig {
    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.call_timeout_secs)
    }
}

/// Confidence scoring constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Confidence for a structured-routed query answered by an exact record
    pub structured_ceiling: f64,
    /// Multiplier applied when only one item supports the answer
    pub single_source_penalty: f64,
    /// Multiplier applied when one retriever's gateway was unavailable
    pub unavailable_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            structured_ceiling: 0.95,
            single_source_penalty: 0.85,
            unavailable_penalty: 0.8,
        }
    }
}

/// Context assembly budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum rendered context length in characters
    pub max_chars: usize,
    /// Maximum characters of a semantic passage rendered per item
    pub snippet_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            snippet_chars: 600,
        }
    }
}

/// Classifier vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Alphanumeric prefix of entity identifiers (followed by digits)
    pub entity_prefix: String,
    /// Department names recognised as `department` filters
    pub departments: Vec<String>,
    /// Office locations recognised as `location` filters
    pub locations: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            entity_prefix: "EMP".to_string(),
            departments: [
                "Engineering",
                "Marketing",
                "Sales",
                "Finance",
                "Human Resources",
                "Operations",
                "Legal",
                "Product",
                "Support",
                "Research",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            locations: [
                "Singapore",
                "London",
                "New York",
                "San Francisco",
                "Bangalore",
                "Sydney",
                "Berlin",
                "Tokyo",
                "Dubai",
                "Toronto",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a path, falling back to defaults when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Resolve the store path: `HYBRIDHR_DB`, then config, then the cache dir
    pub fn database_path(&self) -> PathBuf {
        std::env::var("HYBRIDHR_DB")
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(crate::Database::default_path)
    }

    /// Reject settings that would make every query meaningless.
    ///
    /// Called once at startup; a failure here is the only fatal error class.
    pub fn validate(&self) -> Result<()> {
        if self.llm_service.url.trim().is_empty() {
            return Err(HybridError::Config("llm_service.url is empty".to_string()));
        }
        if self.llm_service.embeddings_url().trim().is_empty() {
            return Err(HybridError::Config(
                "llm_service.embedding_url is empty".to_string(),
            ));
        }
        check_positive_unit("retrieval.similarity_threshold", self.retrieval.similarity_threshold)?;
        check_positive_unit("scoring.structured_ceiling", self.scoring.structured_ceiling)?;
        check_positive_unit("scoring.single_source_penalty", self.scoring.single_source_penalty)?;
        check_positive_unit("scoring.unavailable_penalty", self.scoring.unavailable_penalty)?;
        if self.retrieval.top_k == 0 {
            return Err(HybridError::Config("retrieval.top_k must be > 0".to_string()));
        }
        if self.retrieval.max_results == 0 {
            return Err(HybridError::Config(
                "retrieval.max_results must be > 0".to_string(),
            ));
        }
        if self.context.max_chars == 0 {
            return Err(HybridError::Config("context.max_chars must be > 0".to_string()));
        }
        let prefix = &self.classifier.entity_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(HybridError::Config(format!(
                "classifier.entity_prefix must be non-empty alphanumeric, got '{}'",
                prefix
            )));
        }
        Ok(())
    }
}

/// Accepts values in (0, 1]
fn check_positive_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(HybridError::Config(format!(
            "{} must be within (0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.similarity_threshold, 0.3);
        assert_eq!(config.context.max_chars, 4000);
        assert_eq!(config.scoring.structured_ceiling, 0.95);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.llm_service.url = "  ".to_string();
        assert!(matches!(config.validate(), Err(HybridError::Config(_))));

        let mut config = Config::default();
        config.retrieval.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.similarity_threshold = 0.0;
        assert!(matches!(config.validate(), Err(HybridError::Config(_))));

        let mut config = Config::default();
        config.scoring.unavailable_penalty = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.classifier.entity_prefix = "EMP-".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "llm_service:\n  url: http://llm:9000\nretrieval:\n  top_k: 8\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.url, "http://llm:9000");
        assert_eq!(config.llm_service.max_tokens, 800);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.structured_limit, 20);
        assert_eq!(config.scoring.single_source_penalty, 0.85);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.retrieval.max_results, 5);
    }
}
