use thiserror::Error;

/// Core error type shared across synthload crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema document is malformed or fails the meta-schema.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The schema document is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The schema file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by synthload crates.
pub type Result<T> = std::result::Result<T, Error>;
