mod artifacts;
mod extract;
mod logging;
mod settings;
mod store;
mod survey;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use synthload_core::{Error as CoreError, activation_schema, activation_schema_json, load_schema};
use synthload_generate::{GenerateOptions, GenerationEngine, GenerationError};
use synthload_pipeline::{
    CsvSink, FieldValidator, Pipeline, PipelineError, PipelineReport, ReferenceStore, RowSink,
    SinkError, TeeSink, read_raw_records,
};
use thiserror::Error;
use uuid::Uuid;

use artifacts::{report_path_for, write_bytes_atomic, write_json_atomic};
use extract::{service_counts, service_counts_csv};
use logging::init_logging;
use settings::{Settings, SettingsError, load_settings};
use store::{ActivationTableSink, SqliteReferenceStore, StoreError, prepare_database};
use survey::Survey;

#[derive(Debug, Error)]
enum CliError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("schema error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<SinkError> for CliError {
    fn from(err: SinkError) -> Self {
        CliError::Pipeline(PipelineError::Sink(err))
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "synthload",
    version,
    about = "Synthetic activation data and its validating loader"
)]
struct Cli {
    /// Settings file; defaults to ./synthload.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the bundled activation schema.
    Schema(SchemaArgs),
    /// Generate a CSV dataset, with fault-injected rows, from a schema.
    Generate(GenerateArgs),
    /// Create and seed the SQLite reference database from source rows.
    Prepare(PrepareArgs),
    /// Validate, resolve, transform and save source rows.
    Load(LoadArgs),
    /// Count activations stored by `load --into-db` per service.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON Schema document; the bundled activation schema when omitted.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Output CSV path.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Number of valid rows before the fault-injected ones.
    #[arg(long)]
    count: Option<u64>,
    /// Seed for free-text character choice.
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the null and trash rows.
    #[arg(long, default_value_t = false)]
    no_faults: bool,
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// SQLite database path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Leave the first customer, device and service out of the database.
    #[arg(long, default_value_t = false)]
    withhold_first: bool,
    /// Source CSV files; the generated dataset when omitted.
    #[arg(value_name = "SOURCE")]
    sources: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// SQLite database path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Output CSV path for saved rows.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Also store saved rows in the database's customer_device_service table.
    #[arg(long, default_value_t = false)]
    into_db: bool,
    /// Source CSV file; the generated dataset when omitted.
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// SQLite database path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Output CSV path for the service counts.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// JSON report written next to the load output.
#[derive(Debug, Serialize)]
struct LoadReport<'a> {
    source: &'a Path,
    output: &'a Path,
    database: &'a Path,
    stored_in_database: bool,
    #[serde(flatten)]
    pipeline: &'a PipelineReport,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_logging(&settings.logging)?;

    let run_id = Uuid::new_v4().to_string();
    let timer = Instant::now();
    tracing::info!(event = "run_started", run_id = %run_id);

    match cli.command {
        Command::Schema(args) => run_schema(args)?,
        Command::Generate(args) => run_generate(args, &settings)?,
        Command::Prepare(args) => run_prepare(args, &settings)?,
        Command::Load(args) => run_load(args, &settings)?,
        Command::Extract(args) => run_extract(args, &settings)?,
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let document = activation_schema_json();
    match args.out {
        Some(path) => {
            write_bytes_atomic(&path, document.as_bytes())?;
            tracing::info!(event = "schema_written", path = %path.display());
        }
        None => print!("{document}"),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, settings: &Settings) -> Result<(), CliError> {
    let schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => activation_schema()?,
    };
    let options = GenerateOptions {
        output: args
            .output
            .unwrap_or_else(|| settings.generate.output.clone()),
        count: args.count.unwrap_or(settings.generate.count),
        seed: args.seed.unwrap_or(settings.generate.seed),
        inject_faults: !args.no_faults,
    };

    tracing::info!(event = "generation_started", output = %options.output.display());
    let report = GenerationEngine::new(options).run(&schema)?;
    tracing::info!(
        event = "dataset_written",
        path = %report.output.display(),
        rows = report.total_rows()
    );

    println!(
        "wrote {} rows ({} valid, {} null-injected, {} trash-injected) to {}",
        report.total_rows(),
        report.good_rows,
        report.null_rows,
        report.trash_rows,
        report.output.display()
    );
    Ok(())
}

fn run_prepare(args: PrepareArgs, settings: &Settings) -> Result<(), CliError> {
    let db = args.db.unwrap_or_else(|| settings.load.db.clone());
    let sources = if args.sources.is_empty() {
        vec![settings.generate.output.clone()]
    } else {
        args.sources
    };

    let mut survey = Survey::new(FieldValidator::new()?, &activation_schema()?);
    for source in &sources {
        let file = File::open(source)?;
        for row in read_raw_records(BufReader::new(file))? {
            survey.observe(&row?);
        }
        tracing::info!(event = "source_surveyed", path = %source.display());
    }
    let skipped = survey.skipped();
    let mut seed = survey.finish();
    if seed.is_empty() {
        return Err(CliError::InvalidConfig(
            "no field-valid rows found in the sources".to_string(),
        ));
    }
    if args.withhold_first {
        seed.withhold_first();
    }

    if let Some(parent) = db.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let summary = prepare_database(&db, &seed)?;
    println!(
        "prepared {}: {} customers, {} device types, {} customer devices, {} services ({} rows skipped)",
        db.display(),
        summary.customers,
        summary.device_types,
        summary.customer_devices,
        summary.services,
        skipped
    );
    Ok(())
}

fn run_load(args: LoadArgs, settings: &Settings) -> Result<(), CliError> {
    let db = args.db.unwrap_or_else(|| settings.load.db.clone());
    let output = args
        .output
        .unwrap_or_else(|| settings.load.output.clone());
    let source = args
        .source
        .unwrap_or_else(|| settings.generate.output.clone());
    if !db.exists() {
        return Err(CliError::InvalidConfig(format!(
            "reference database {} not found; run `synthload prepare` first",
            db.display()
        )));
    }

    let store = SqliteReferenceStore::open(&db)?;
    let csv_sink = CsvSink::create(&output)?;

    tracing::info!(
        event = "load_started",
        source = %source.display(),
        db = %db.display(),
        into_db = args.into_db
    );
    let report = if args.into_db {
        let sink = TeeSink::new(csv_sink, ActivationTableSink::open(&db)?);
        let (report, sink) = run_pipeline(store, sink, &source)?;
        let (csv_sink, table_sink) = sink.into_parts();
        csv_sink.into_inner()?;
        tracing::info!(event = "activations_written", rows = table_sink.rows_written());
        report
    } else {
        let (report, csv_sink) = run_pipeline(store, csv_sink, &source)?;
        csv_sink.into_inner()?;
        report
    };
    tracing::info!(event = "output_written", path = %output.display());

    let report_path = report_path_for(&output);
    write_json_atomic(
        &report_path,
        &LoadReport {
            source: &source,
            output: &output,
            database: &db,
            stored_in_database: args.into_db,
            pipeline: &report,
        },
    )?;
    tracing::info!(event = "report_written", path = %report_path.display());

    for line in report.counts.summary_lines() {
        println!("{line}");
    }
    Ok(())
}

fn run_pipeline<S: ReferenceStore, K: RowSink>(
    store: S,
    sink: K,
    source: &Path,
) -> Result<(PipelineReport, K), CliError> {
    let mut pipeline = Pipeline::new(store, sink)?;
    let file = File::open(source)?;
    let report = pipeline.run_csv(BufReader::new(file))?;
    Ok((report, pipeline.into_sink()))
}

fn run_extract(args: ExtractArgs, settings: &Settings) -> Result<(), CliError> {
    let db = args.db.unwrap_or_else(|| settings.load.db.clone());
    let output = args
        .output
        .unwrap_or_else(|| settings.extract.output.clone());
    if !db.exists() {
        return Err(CliError::InvalidConfig(format!(
            "reference database {} not found; run `synthload prepare` first",
            db.display()
        )));
    }

    let report = service_counts(&db)?;
    write_bytes_atomic(&output, &service_counts_csv(&report.services)?)?;
    tracing::info!(event = "service_counts_written", path = %output.display());

    println!(
        "wrote {} services ({} activations) to {}",
        report.services.len(),
        report.activations,
        output.display()
    );
    Ok(())
}
