//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use leasewise_rag::RagConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active user; every user gets their own data directory
    #[serde(default = "default_user")]
    pub active_user: String,

    /// Root of per-user data (defaults to `~/.leasewise/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Language model backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Pipeline tuning
    #[serde(default)]
    pub rag: RagConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Command history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Ollama chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Ollama endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Attempts per request
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// Which embedding model backs the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local feature hashing, no model needed
    Hashing,
    /// Ollama embedding model
    Ollama,
}

/// Embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Backend
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    /// Ollama embedding model (ignored for hashing)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Per-user directory layout under the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPaths {
    /// `<data_dir>/<user>`
    pub root: PathBuf,
    /// Chunk cache entries
    pub cache: PathBuf,
    /// Serialized vector indexes
    pub vector_stores: PathBuf,
    /// SQLite metadata database
    pub metadata_db: PathBuf,
}

impl UserPaths {
    /// Layout for `user` under `data_dir`
    pub fn new(data_dir: &Path, user: &str) -> Self {
        let root = data_dir.join(user);
        Self {
            cache: root.join("cache"),
            vector_stores: root.join("vector_stores"),
            metadata_db: root.join("metadata.db"),
            root,
        }
    }

    /// Create the directories
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.cache)?;
        fs::create_dir_all(&self.vector_stores)?;
        Ok(())
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(home()?.join(".leasewise").join("config.toml"))
    }

    /// Load configuration from the default path, or defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.rag.validate().map_err(CliError::Config)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Data root, resolved against the home directory when unset.
    pub fn data_root(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(home()?.join(".leasewise").join("data")),
        }
    }

    /// Directory layout for the active user.
    pub fn user_paths(&self) -> Result<UserPaths> {
        Ok(UserPaths::new(&self.data_root()?, &self.active_user))
    }

    /// Switch to a different user.
    pub fn switch_user(&mut self, name: String) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CliError::InvalidInput(format!(
                "User name '{}' may only contain letters, digits, '-' and '_'",
                name
            )));
        }
        self.active_user = name;
        Ok(())
    }
}

fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_user: default_user(),
            data_dir: None,
            settings: Settings::default(),
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: 0.0,
            max_retries: default_retries(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimension: default_dimension(),
        }
    }
}

fn default_user() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Hashing
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    384
}
