use thiserror::Error;

/// Failure of the external reference store. Fatal for a run.
#[derive(Debug, Error)]
pub enum ReferenceStoreError {
    #[error("reference store unavailable: {0}")]
    Unavailable(String),
    #[error("reference query failed: {0}")]
    Query(String),
}

/// Failure writing an accepted record. Fatal for a run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row store error: {0}")]
    Backend(String),
}

/// Run-level pipeline errors. Per-record rejections are never errors; they
/// are reported as [`crate::RecordOutcome`] values.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("source error: {0}")]
    Source(csv::Error),
    #[error(transparent)]
    Store(#[from] ReferenceStoreError),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}
