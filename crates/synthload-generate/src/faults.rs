use serde::Serialize;

use crate::assembler::RecordAssembler;
use crate::generators::{GeneratedValue, Record};

/// How a single field was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Injection {
    /// Field overwritten with an empty string.
    Null,
    /// Field overwritten with its generator's trash value.
    Trash,
}

/// A fresh record with exactly one property broken.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectedRecord {
    pub strategy: Injection,
    pub property: String,
    pub record: Record,
}

/// Produces the single-field defect matrix for an assembler's schema.
pub struct FaultInjector<'a> {
    assembler: &'a mut RecordAssembler,
}

impl<'a> FaultInjector<'a> {
    pub fn new(assembler: &'a mut RecordAssembler) -> Self {
        Self { assembler }
    }

    /// One row per property, that property blanked.
    pub fn null_rows(&mut self) -> Vec<InjectedRecord> {
        self.inject(Injection::Null)
    }

    /// One row per property, that property replaced by trash.
    pub fn trash_rows(&mut self) -> Vec<InjectedRecord> {
        self.inject(Injection::Trash)
    }

    /// Null-injected rows followed by trash-injected rows.
    pub fn all_rows(&mut self) -> Vec<InjectedRecord> {
        let mut rows = self.null_rows();
        rows.extend(self.trash_rows());
        rows
    }

    fn inject(&mut self, strategy: Injection) -> Vec<InjectedRecord> {
        let properties = self.assembler.property_names();
        let mut rows = Vec::with_capacity(properties.len());
        for property in properties {
            let mut record = self.assembler.next_record();
            let broken = match strategy {
                Injection::Null => GeneratedValue::Text(String::new()),
                Injection::Trash => self
                    .assembler
                    .trash_for(&property)
                    .unwrap_or(GeneratedValue::Text(String::new())),
            };
            record.set(&property, broken);
            rows.push(InjectedRecord {
                strategy,
                property,
                record,
            });
        }
        rows
    }
}
