use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::ViewKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where cloned repositories are checked out
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Base URL used to turn an `owner/name` identifier into a clone URL
    pub git_base_url: String,
    /// Git personal access token for cloning private repos
    pub git_token: Option<String>,
    /// Timeout for git clone operations in seconds
    pub clone_timeout_secs: u64,
    /// Extraction thresholds
    pub chunking: ChunkingConfig,
    /// Result count used when a query does not specify `k`
    pub default_k: usize,
    /// Largest `k` a query may ask for
    pub max_k: usize,
    /// Vector modalities, one vector index each
    pub modalities: Vec<ModalityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Units with a shorter body are dropped as noise
    pub min_unit_chars: usize,
    /// Paragraph blocks shorter than this are held back for the next block
    pub min_block_chars: usize,
    /// Paragraph buffer is emitted once it reaches this size
    pub target_chunk_chars: usize,
    /// Skip `test`/`tests`/`__tests__`/`spec` directories
    pub exclude_tests: bool,
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_unit_chars: 20,
            min_block_chars: 40,
            target_chunk_chars: 500,
            exclude_tests: false,
            max_file_bytes: 1_048_576,
        }
    }
}

/// One vector modality: which unit view it embeds and with which provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalityConfig {
    /// Name used to select the modality in a query (e.g. "minilm")
    pub name: String,
    /// Label reported with each result
    pub label: String,
    pub view: ViewKind,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama", "openai" or "hashing"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dims: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            api_key: None,
            dims: 384,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            git_base_url: "https://github.com".to_string(),
            git_token: None,
            clone_timeout_secs: 300,
            chunking: ChunkingConfig::default(),
            default_k: 5,
            max_k: 50,
            modalities: vec![ModalityConfig {
                name: "minilm".to_string(),
                label: "MiniLM".to_string(),
                view: ViewKind::Semantic,
                embedding: EmbeddingConfig::default(),
            }],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SMART_GREP_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("SMART_GREP_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("SMART_GREP_GIT_BASE_URL") {
            config.git_base_url = url;
        }
        if let Ok(token) = std::env::var("SMART_GREP_GIT_TOKEN") {
            config.git_token = Some(token);
        }
        if let Ok(val) = std::env::var("SMART_GREP_CLONE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.clone_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("SMART_GREP_EXCLUDE_TESTS") {
            config.chunking.exclude_tests = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("SMART_GREP_MIN_UNIT_CHARS") {
            if let Ok(v) = val.parse() {
                config.chunking.min_unit_chars = v;
            }
        }
        if let Ok(val) = std::env::var("SMART_GREP_TARGET_CHUNK_CHARS") {
            if let Ok(v) = val.parse() {
                config.chunking.target_chunk_chars = v;
            }
        }
        if let Ok(val) = std::env::var("SMART_GREP_DEFAULT_K") {
            if let Ok(v) = val.parse() {
                config.default_k = v;
            }
        }
        if let Ok(val) = std::env::var("SMART_GREP_MAX_K") {
            if let Ok(v) = val.parse() {
                config.max_k = v;
            }
        }

        // Embedding provider for the semantic modality
        let semantic = &mut config.modalities[0].embedding;
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            semantic.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            semantic.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            semantic.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            semantic.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                semantic.dims = d;
            }
        }

        // Optional second vector space over the raw code view
        if let Ok(model) = std::env::var("SMART_GREP_CODE_MODEL") {
            let mut embedding = config.modalities[0].embedding.clone();
            embedding.model = model;
            if let Ok(dim) = std::env::var("SMART_GREP_CODE_DIM") {
                if let Ok(d) = dim.parse() {
                    embedding.dims = d;
                }
            }
            config.modalities.push(ModalityConfig {
                name: "code".to_string(),
                label: "Code".to_string(),
                view: ViewKind::Code,
                embedding,
            });
        }

        config
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }
}
