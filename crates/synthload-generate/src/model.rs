use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// CSV file receiving the generated rows.
    pub output: PathBuf,
    /// Number of structurally valid rows.
    pub count: u64,
    /// Seed for the run RNG.
    pub seed: u64,
    /// Append the null/trash defect matrix after the valid rows.
    pub inject_faults: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("data/activation_source.csv"),
            count: 100,
            seed: 42,
            inject_faults: true,
        }
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub schema_title: Option<String>,
    pub output: PathBuf,
    pub seed: u64,
    pub good_rows: u64,
    pub null_rows: u64,
    pub trash_rows: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn bad_rows(&self) -> u64 {
        self.null_rows + self.trash_rows
    }

    pub fn total_rows(&self) -> u64 {
        self.good_rows + self.bad_rows()
    }
}
