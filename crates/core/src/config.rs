//! Configuration management for Startup Navigator.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The YAML config file (`.navigator/config.yaml` or `NAVIGATOR_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: relative paths (catalog, store) are
//! resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Directory under the workspace holding config, prompts and the vector store.
pub const NAVIGATOR_DIR: &str = ".navigator";

const KNOWN_LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];
const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .navigator/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Book catalog CSV (relative to workspace unless absolute)
    pub catalog_path: PathBuf,

    /// Directory holding the persisted vector store artifacts
    pub store_dir: PathBuf,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Generative model settings
    pub llm: LlmSettings,

    /// Retrieval and network settings
    pub retrieval: RetrievalSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "openai", "ollama" or "mock"
    pub provider: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Expected vector length
    pub dimensions: usize,

    /// Custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            endpoint: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        }
    }
}

/// Generative model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider name: "openai" or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens in the generated document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Retrieval, fan-out and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of candidates handed to the generative step
    pub top_k: usize,

    /// Maximum concurrent embedding calls while building the index
    pub concurrency: usize,

    /// Timeout applied to every external call
    pub request_timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            concurrency: 4,
            request_timeout_secs: 30,
        }
    }
}

/// Full configuration file structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    catalog: Option<String>,
    store_dir: Option<String>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    retrieval: Option<RetrievalFile>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalFile {
    top_k: Option<usize>,
    concurrency: Option<usize>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            catalog_path: PathBuf::from("books_data_new.csv"),
            store_dir: PathBuf::from(NAVIGATOR_DIR).join("store"),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            retrieval: RetrievalSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `workspace` and `config_file` come from the command line when given;
    /// otherwise `NAVIGATOR_WORKSPACE` / `NAVIGATOR_CONFIG` are consulted.
    ///
    /// Environment variables:
    /// - `NAVIGATOR_WORKSPACE`, `NAVIGATOR_CONFIG`
    /// - `NAVIGATOR_CATALOG`
    /// - `NAVIGATOR_LLM_PROVIDER`, `NAVIGATOR_LLM_MODEL`
    /// - `NAVIGATOR_EMBEDDING_PROVIDER`, `NAVIGATOR_EMBEDDING_MODEL`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("NAVIGATOR_WORKSPACE")) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env_path("NAVIGATOR_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.navigator_dir().join("config.yaml"));

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(|e| {
                AppError::Config(format!("Failed to read config file {:?}: {}", config_path, e))
            })?;
            config = config.merge_yaml(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", config_path, e))
            })?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();

        Ok(config)
    }

    /// Merge a YAML document into this config, returning the merged copy.
    fn merge_yaml(&self, contents: &str) -> AppResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(catalog) = file.catalog {
            result.catalog_path = PathBuf::from(catalog);
        }
        if let Some(store_dir) = file.store_dir {
            result.store_dir = PathBuf::from(store_dir);
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(llm) = file.llm {
            result.llm = llm;
        }
        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.retrieval.top_k = top_k;
            }
            if let Some(concurrency) = retrieval.concurrency {
                result.retrieval.concurrency = concurrency;
            }
            if let Some(timeout) = retrieval.request_timeout_secs {
                result.retrieval.request_timeout_secs = timeout;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self) {
        if let Some(catalog) = env_path("NAVIGATOR_CATALOG") {
            self.catalog_path = catalog;
        }
        if let Ok(provider) = std::env::var("NAVIGATOR_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("NAVIGATOR_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(provider) = std::env::var("NAVIGATOR_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Ok(model) = std::env::var("NAVIGATOR_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .navigator directory.
    pub fn navigator_dir(&self) -> PathBuf {
        self.workspace.join(NAVIGATOR_DIR)
    }

    /// Catalog CSV path resolved against the workspace.
    pub fn catalog_path(&self) -> PathBuf {
        self.workspace.join(&self.catalog_path)
    }

    /// Vector store directory resolved against the workspace.
    pub fn store_dir(&self) -> PathBuf {
        self.workspace.join(&self.store_dir)
    }

    /// Directory searched for prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.navigator_dir().join("prompts")
    }

    /// Ensure the .navigator directory exists.
    pub fn ensure_navigator_dir(&self) -> AppResult<()> {
        let dir = self.navigator_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", NAVIGATOR_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Resolve an API key from the named environment variable.
    pub fn resolve_api_key(api_key_env: Option<&str>) -> Option<String> {
        api_key_env
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate provider names and numeric ranges.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        if self.retrieval.concurrency == 0 {
            return Err(AppError::Config(
                "retrieval.concurrency must be at least 1".to_string(),
            ));
        }

        if self.retrieval.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "retrieval.requestTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::Config(format!(
                    "llm.temperature must be within 0.0-2.0, got {}",
                    temperature
                )));
            }
        }

        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Write a config to disk as YAML (used to scaffold a workspace).
pub fn write_default_config(path: &Path) -> AppResult<()> {
    let defaults = AppConfig::default();
    let file = ConfigFile {
        catalog: Some(defaults.catalog_path.to_string_lossy().to_string()),
        store_dir: Some(defaults.store_dir.to_string_lossy().to_string()),
        embedding: Some(defaults.embedding),
        llm: Some(defaults.llm),
        retrieval: Some(RetrievalFile {
            top_k: Some(defaults.retrieval.top_k),
            concurrency: Some(defaults.retrieval.concurrency),
            request_timeout_secs: Some(defaults.retrieval.request_timeout_secs),
        }),
        logging: None,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(&file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let config = AppConfig {
            workspace: PathBuf::from("/work"),
            ..AppConfig::default()
        };
        assert_eq!(config.catalog_path(), PathBuf::from("/work/books_data_new.csv"));
        assert_eq!(config.store_dir(), PathBuf::from("/work/.navigator/store"));
        assert!(config.prompts_dir().ends_with(".navigator/prompts"));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let yaml = r#"
catalog: data/books.csv
embedding:
  provider: mock
  model: trigram-v1
  dimensions: 64
retrieval:
  topK: 3
logging:
  level: debug
  color: false
"#;
        let merged = AppConfig::default().merge_yaml(yaml).unwrap();
        assert_eq!(merged.catalog_path, PathBuf::from("data/books.csv"));
        assert_eq!(merged.embedding.provider, "mock");
        assert_eq!(merged.embedding.dimensions, 64);
        assert_eq!(merged.retrieval.top_k, 3);
        assert_eq!(merged.retrieval.concurrency, 4);
        assert_eq!(merged.llm, LlmSettings::default());
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let result = AppConfig::default().merge_yaml("retrieval: [1, 2");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_workspace_config_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(NAVIGATOR_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "llm:\n  provider: ollama\n  model: llama3.2\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.llm.model, "llama3.2");
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.llm.temperature = Some(3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_default_config_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(NAVIGATOR_DIR).join("config.yaml");
        write_default_config(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let merged = AppConfig::default().merge_yaml(&contents).unwrap();
        assert_eq!(merged.embedding, EmbeddingSettings::default());
        assert_eq!(merged.retrieval, RetrievalSettings::default());
    }
}
