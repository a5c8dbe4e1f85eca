use std::time::Instant;

use tracing::info;

use synthload_core::SchemaNode;

use crate::assembler::RecordAssembler;
use crate::errors::GenerationError;
use crate::faults::{FaultInjector, Injection};
use crate::model::{GenerateOptions, GenerationReport};
use crate::output::RecordCsvWriter;

/// Entry point for writing a generated dataset to CSV.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Build generators for `schema` and write good rows, then null-injected
    /// rows, then trash-injected rows.
    pub fn run(&self, schema: &SchemaNode) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut assembler = RecordAssembler::new(schema, self.options.seed)?;
        let header = assembler.property_names();

        info!(
            run_id = %run_id,
            output = %self.options.output.display(),
            count = self.options.count,
            seed = self.options.seed,
            properties = header.len(),
            "generation started"
        );

        let mut writer = RecordCsvWriter::create(&self.options.output, header)?;
        for record in assembler.by_ref().take(self.options.count as usize) {
            writer.write(&record)?;
        }
        let good_rows = writer.rows_written();

        let (mut null_rows, mut trash_rows) = (0_u64, 0_u64);
        if self.options.inject_faults {
            for injected in FaultInjector::new(&mut assembler).all_rows() {
                writer.write(&injected.record)?;
                match injected.strategy {
                    Injection::Null => null_rows += 1,
                    Injection::Trash => trash_rows += 1,
                }
            }
        }

        let bytes_written = writer.finish()?;
        let report = GenerationReport {
            run_id,
            schema_title: schema.title.clone(),
            output: self.options.output.clone(),
            seed: self.options.seed,
            good_rows,
            null_rows,
            trash_rows,
            bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %report.run_id,
            good_rows = report.good_rows,
            bad_rows = report.bad_rows(),
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(report)
    }
}
