use serde::Serialize;
use uuid::Uuid;

use crate::resolve::ResolverStats;

/// Per-gate counters for one run. Each record increments exactly one
/// terminal counter plus the pass counters of the gates before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub raw: u64,
    pub valid: u64,
    pub invalid: u64,
    pub valid_references: u64,
    pub invalid_references: u64,
    pub transformed: u64,
    pub transform_errors: u64,
    pub saved: u64,
}

impl OutcomeCounts {
    pub fn is_balanced(&self) -> bool {
        self.raw == self.valid + self.invalid
            && self.valid == self.valid_references + self.invalid_references
            && self.valid_references == self.transformed + self.transform_errors
            && self.transformed == self.saved
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("raw records: {}", self.raw),
            format!("valid records: {}", self.valid),
            format!("invalid records: {}", self.invalid),
            format!("valid references: {}", self.valid_references),
            format!("invalid references: {}", self.invalid_references),
            format!("transformed records: {}", self.transformed),
            format!("transform errors: {}", self.transform_errors),
            format!("saved records: {}", self.saved),
        ]
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub counts: OutcomeCounts,
    pub resolver: ResolverStats,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub(crate) fn new(counts: OutcomeCounts, resolver: ResolverStats, duration_ms: u64) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            counts,
            resolver,
            duration_ms,
        }
    }
}
