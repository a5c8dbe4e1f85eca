use std::io::Read;
use std::time::Instant;

use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::record::{LoadRecord, RawRecord};
use crate::report::{OutcomeCounts, PipelineReport};
use crate::resolve::{ReferenceResolver, ReferenceStore, Resolution};
use crate::sink::RowSink;
use crate::source::read_raw_records;
use crate::transform::{TransformFailure, Transformer};
use crate::validate::{FieldFailure, FieldValidator};

/// Gates a record passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Raw,
    FieldChecked,
    ReferenceChecked,
    Transformed,
    Saved,
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    InvalidField(Vec<FieldFailure>),
    InvalidReference(Vec<&'static str>),
    TransformError(TransformFailure),
    Saved(LoadRecord),
}

impl RecordOutcome {
    /// Last stage the record reached before it terminated.
    pub fn stage(&self) -> Stage {
        match self {
            RecordOutcome::InvalidField(_) => Stage::Raw,
            RecordOutcome::InvalidReference(_) => Stage::FieldChecked,
            RecordOutcome::TransformError(_) => Stage::ReferenceChecked,
            RecordOutcome::Saved(_) => Stage::Saved,
        }
    }

    /// Whether the record passed the gate into `stage`.
    pub fn reached(&self, stage: Stage) -> bool {
        self.stage() >= stage
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, RecordOutcome::Saved(_))
    }
}

impl OutcomeCounts {
    /// Count one terminated record at every gate it passed and at the gate
    /// that stopped it.
    fn tally(&mut self, outcome: &RecordOutcome) {
        self.raw += 1;
        if !outcome.reached(Stage::FieldChecked) {
            self.invalid += 1;
            return;
        }
        self.valid += 1;
        if !outcome.reached(Stage::ReferenceChecked) {
            self.invalid_references += 1;
            return;
        }
        self.valid_references += 1;
        if !outcome.reached(Stage::Transformed) {
            self.transform_errors += 1;
            return;
        }
        self.transformed += 1;
        if outcome.is_saved() {
            self.saved += 1;
        }
    }
}

/// Validate, resolve, transform and persist activation records.
///
/// Records are processed one at a time in input order. Rejections are
/// counted and logged; only store and sink failures abort a run.
pub struct Pipeline<S, K> {
    validator: FieldValidator,
    resolver: ReferenceResolver<S>,
    transformer: Transformer,
    sink: K,
    counts: OutcomeCounts,
}

impl<S: ReferenceStore, K: RowSink> Pipeline<S, K> {
    pub fn new(store: S, sink: K) -> Result<Self, PipelineError> {
        Ok(Self {
            validator: FieldValidator::new()?,
            resolver: ReferenceResolver::new(store),
            transformer: Transformer::new()?,
            sink,
            counts: OutcomeCounts::default(),
        })
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    pub fn resolver(&self) -> &ReferenceResolver<S> {
        &self.resolver
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Push one record through every gate it passes.
    pub fn process(&mut self, raw: RawRecord) -> Result<RecordOutcome, PipelineError> {
        let outcome = self.advance(raw)?;
        self.counts.tally(&outcome);
        Ok(outcome)
    }

    fn advance(&mut self, raw: RawRecord) -> Result<RecordOutcome, PipelineError> {
        let activation = match self.validator.validate(&raw) {
            Ok(activation) => activation,
            Err(failures) => {
                for failure in &failures {
                    warn!(
                        field = failure.field,
                        value = %failure.value,
                        reason = failure.reason,
                        "record rejected: invalid field"
                    );
                }
                return Ok(RecordOutcome::InvalidField(failures));
            }
        };

        let resolved = match self.resolver.check(activation)? {
            Resolution::Resolved(resolved) => resolved,
            Resolution::Unresolved(fields) => {
                warn!(fields = ?fields, "record rejected: unresolved reference");
                return Ok(RecordOutcome::InvalidReference(fields));
            }
        };

        let record = match self.transformer.transform(resolved) {
            Ok(record) => record,
            Err(failure) => {
                warn!(
                    field = failure.field,
                    reason = %failure.reason,
                    "record rejected: transform failed"
                );
                return Ok(RecordOutcome::TransformError(failure));
            }
        };

        self.sink.save(&record)?;
        Ok(RecordOutcome::Saved(record))
    }

    /// Process a whole batch. Counters and resolver caches start empty.
    pub fn run<I>(&mut self, records: I) -> Result<PipelineReport, PipelineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        self.run_fallible(records.into_iter().map(Ok))
    }

    /// Process every row of a headed CSV stream.
    pub fn run_csv<R: Read>(&mut self, reader: R) -> Result<PipelineReport, PipelineError> {
        let rows = read_raw_records(reader).map_err(PipelineError::Source)?;
        self.run_fallible(rows.map(|row| row.map_err(PipelineError::Source)))
    }

    fn run_fallible<I>(&mut self, records: I) -> Result<PipelineReport, PipelineError>
    where
        I: Iterator<Item = Result<RawRecord, PipelineError>>,
    {
        let start = Instant::now();
        self.counts = OutcomeCounts::default();
        self.resolver.clear();
        info!("pipeline run started");

        for raw in records {
            self.process(raw?)?;
        }
        self.sink.flush()?;

        let report = PipelineReport::new(
            self.counts,
            self.resolver.stats(),
            start.elapsed().as_millis() as u64,
        );
        info!(
            run_id = %report.run_id,
            raw = report.counts.raw,
            saved = report.counts.saved,
            store_queries = report.resolver.store_queries,
            cache_hits = report.resolver.cache_hits,
            duration_ms = report.duration_ms,
            "pipeline run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn saved() -> RecordOutcome {
        RecordOutcome::Saved(LoadRecord {
            customer_device_id: 1,
            service_id: 2,
            start_date: DateTime::parse_from_rfc3339("2022-07-10T11:12:13+00:00").expect("date"),
            latitude: 1.0,
            longitude: 2.0,
        })
    }

    fn transform_error() -> RecordOutcome {
        RecordOutcome::TransformError(TransformFailure {
            field: "latitude",
            reason: "unparseable coordinate".to_string(),
        })
    }

    #[test]
    fn saved_records_passed_every_gate() {
        let outcome = saved();
        assert!(outcome.is_saved());
        for stage in [
            Stage::FieldChecked,
            Stage::ReferenceChecked,
            Stage::Transformed,
            Stage::Saved,
        ] {
            assert!(outcome.reached(stage), "{stage:?}");
        }
    }

    #[test]
    fn rejections_stop_before_their_gate() {
        let invalid = RecordOutcome::InvalidField(Vec::new());
        assert!(!invalid.reached(Stage::FieldChecked));

        let unresolved = RecordOutcome::InvalidReference(vec!["service_name"]);
        assert!(unresolved.reached(Stage::FieldChecked));
        assert!(!unresolved.reached(Stage::ReferenceChecked));

        let failed = transform_error();
        assert!(failed.reached(Stage::ReferenceChecked));
        assert!(!failed.reached(Stage::Transformed));
        assert!(!failed.is_saved());
    }

    #[test]
    fn tally_counts_each_record_once_per_gate() {
        let mut counts = OutcomeCounts::default();
        counts.tally(&RecordOutcome::InvalidField(Vec::new()));
        counts.tally(&RecordOutcome::InvalidReference(vec!["customer_name"]));
        counts.tally(&transform_error());
        counts.tally(&saved());

        assert_eq!(counts.raw, 4);
        assert_eq!((counts.valid, counts.invalid), (3, 1));
        assert_eq!((counts.valid_references, counts.invalid_references), (2, 1));
        assert_eq!((counts.transformed, counts.transform_errors), (1, 1));
        assert_eq!(counts.saved, 1);
        assert!(counts.is_balanced());
    }
}
