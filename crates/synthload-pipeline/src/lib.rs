//! Validate → resolve → transform → persist pipeline for activation records.
//!
//! Each record walks a fixed sequence of gates and stops at the first one it
//! fails. Per-record rejections are counted, never raised; only reference
//! store and sink failures end a run early.

pub mod errors;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod resolve;
pub mod sink;
pub mod source;
pub mod transform;
pub mod validate;

pub use errors::{PipelineError, ReferenceStoreError, SinkError};
pub use pipeline::{Pipeline, RecordOutcome, Stage};
pub use record::{
    Activation, LoadRecord, OUTPUT_COLUMNS, RawRecord, ResolvedActivation, SurrogateId,
    format_timestamp,
};
pub use report::{OutcomeCounts, PipelineReport};
pub use resolve::{InMemoryReferenceStore, ReferenceResolver, ReferenceStore, Resolution, ResolverStats};
pub use sink::{CsvSink, MemorySink, RowSink, TeeSink};
pub use source::read_raw_records;
pub use transform::{TransformFailure, Transformer, parse_timestamp};
pub use validate::{FieldFailure, FieldValidator};
