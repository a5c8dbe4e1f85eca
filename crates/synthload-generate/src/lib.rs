//! Schema-driven record generation for synthload.
//!
//! A schema node is mapped to one generator variant per `(type, format)`.
//! Generators are deterministic counters apart from the seeded character
//! choice of free text, so a seed reproduces a dataset exactly. The fault
//! injector appends rows with a single broken field to exercise validators.

pub mod assembler;
pub mod engine;
pub mod errors;
pub mod faults;
pub mod generators;
pub mod model;
pub mod output;

pub use assembler::RecordAssembler;
pub use engine::GenerationEngine;
pub use errors::GenerationError;
pub use faults::{FaultInjector, InjectedRecord, Injection};
pub use generators::{GeneratedValue, Generator, Record, ValueGenerator};
pub use model::{GenerateOptions, GenerationReport};
