use thiserror::Error;

/// Errors emitted while building generators or writing generated rows.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("schema error: {0}")]
    Schema(#[from] synthload_core::Error),
    #[error("unsupported schema node: {0}")]
    Unsupported(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
