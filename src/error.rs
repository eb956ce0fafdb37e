use thiserror::Error;

/// Errors surfaced by the search library.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A corpus record that cannot be indexed. Reported per record, never fatal to a build.
    #[error("malformed document at position {position}: {reason}")]
    MalformedDocument { position: usize, reason: String },

    /// A query was issued before any index was built.
    #[error("search index has not been built")]
    NotBuilt,

    #[error("failed to load corpus: {0}")]
    Corpus(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
