use thiserror::Error;

/// Unified error type for repo-fixtures operations
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported commit convention: '{0}'")]
    UnsupportedConvention(String),

    #[error("Commit spec has no message for convention '{0}'")]
    InvalidConvention(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Invalid action sequence: {0}")]
    Sequencing(String),

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Convenience type alias for Results in repo-fixtures
pub type Result<T> = std::result::Result<T, FixtureError>;

impl FixtureError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        FixtureError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        FixtureError::Version(msg.into())
    }

    /// Create a sequencing error for the action at `index`
    pub fn sequencing(index: usize, msg: impl AsRef<str>) -> Self {
        FixtureError::Sequencing(format!("action #{}: {}", index, msg.as_ref()))
    }

    /// Create a merge error with context
    pub fn merge(msg: impl Into<String>) -> Self {
        FixtureError::Merge(msg.into())
    }

    /// Create a cache error with context
    pub fn cache(msg: impl Into<String>) -> Self {
        FixtureError::Cache(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        FixtureError::Invariant(msg.into())
    }
}
