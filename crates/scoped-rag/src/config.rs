//! Configuration for the role-scoped RAG engine

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Document tree and chunking configuration
    pub ingestion: IngestionConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Similarity search configuration
    pub retrieval: RetrievalConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Role to department mapping
    pub access: AccessConfig,
    /// Static user directory, keyed by username
    pub users: BTreeMap<String, UserConfig>,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.chunk_size == 0 {
            return Err(Error::Config("ingestion.chunk_size must be positive".to_string()));
        }
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(Error::Config(format!(
                "ingestion.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingestion.chunk_overlap, self.ingestion.chunk_size
            )));
        }
        if self.ingestion.tabular_target_chunks == 0 {
            return Err(Error::Config(
                "ingestion.tabular_target_chunks must be positive".to_string(),
            ));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.score_threshold) {
            return Err(Error::Config(format!(
                "retrieval.score_threshold ({}) must be within [0, 1]",
                self.retrieval.score_threshold
            )));
        }
        for (username, user) in &self.users {
            if !self.access.roles.contains_key(&user.role) {
                tracing::warn!(
                    "User '{}' has role '{}' which is not configured; it will fall back to '{}'",
                    username,
                    user.role,
                    self.access.fallback_role
                );
            }
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Document tree and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Root directory; each immediate subdirectory is a department
    pub data_dir: PathBuf,
    /// Text window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive text windows in characters
    pub chunk_overlap: usize,
    /// Tabular files are split into roughly this many data chunks
    pub tabular_target_chunks: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./resources/data"),
            chunk_size: 300,
            chunk_overlap: 50,
            tabular_target_chunks: 40,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local feature-hashing embedder, no network
    #[default]
    Hashing,
    /// Ollama embeddings endpoint
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces vectors
    pub provider: EmbeddingBackend,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Number of chunk texts embedded per call
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Hashing,
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Similarity search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of chunks returned per query
    pub top_k: usize,
    /// Minimum relevance score (0.0-1.0)
    pub score_threshold: f32,
    /// Citation preview length in characters
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_threshold: 0.3,
            preview_chars: 200,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound for a single generation call, retries included
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "phi3".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Role to department mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Permitted departments per role
    pub roles: BTreeMap<String, BTreeSet<String>>,
    /// Role whose departments apply to unknown roles
    pub fallback_role: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        let all = ["finance", "marketing", "hr", "engineering", "general"];
        let mut roles = BTreeMap::new();
        for dept in ["finance", "marketing", "hr", "engineering"] {
            roles.insert(dept.to_string(), BTreeSet::from([dept.to_string()]));
        }
        roles.insert("employee".to_string(), BTreeSet::from(["general".to_string()]));
        roles.insert(
            "c-level".to_string(),
            all.iter().map(|d| d.to_string()).collect(),
        );

        Self {
            roles,
            fallback_role: "employee".to_string(),
        }
    }
}

/// A user entry in the static directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Role string handed to the engine
    pub role: String,
    /// Hex-encoded SHA-256 of the password
    pub password_sha256: String,
}
