use thiserror::Error;

/// Errors surfaced by index build, index load and query evaluation.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was rejected by the parser; no partial tree is produced.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A persisted artifact is truncated or its framing is inconsistent.
    #[error("decode error: {0}")]
    Decode(String),

    /// The operation is not available for the loaded index or query shape.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        SearchError::Syntax(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        SearchError::Decode(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        SearchError::Unsupported(msg.into())
    }

    /// True for errors caused by the query text rather than the index.
    pub fn is_query_error(&self) -> bool {
        matches!(self, SearchError::Syntax(_) | SearchError::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
