use thiserror::Error;

/// Failures surfaced by ingestion and query serving.
///
/// Per-file read and parse failures never appear here: the extractor logs and
/// skips them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid repository identifier: {0}")]
    InvalidRepository(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("no indexable content found")]
    NoIndexableContent,

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("no repository is currently indexed")]
    NothingIndexed,

    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// True for errors caused by the request rather than the system.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidRepository(_)
                | EngineError::InvalidQuery(_)
                | EngineError::NothingIndexed
        )
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
