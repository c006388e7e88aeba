use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Self-link rejected for {0}")]
    SelfLink(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl SeoError {
    /// True when the error came from the catalog or link store rather than
    /// from the caller's input.
    pub fn is_persistence(&self) -> bool {
        matches!(self, SeoError::Persistence(_) | SeoError::LockPoisoned)
    }
}

pub type Result<T> = std::result::Result<T, SeoError>;
