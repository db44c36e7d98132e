use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Embedding provider failed: {reason}")]
    Provider { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("Index is empty: no data ingested")]
    EmptyIndex,

    #[error("Index references unknown chunk: {0}")]
    IndexConsistency(String),

    #[error("Generation provider failed: {reason}")]
    Generation { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider { reason: reason.into() }
    }

    pub fn generation(reason: impl Into<String>) -> Self {
        Self::Generation { reason: reason.into() }
    }

    /// Only failures of external providers are transient; everything else is
    /// deterministic and retrying would reproduce it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Generation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
