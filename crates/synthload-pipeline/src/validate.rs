use regex::Regex;

use crate::errors::PipelineError;
use crate::record::{Activation, RawRecord};

const TIMESTAMP_PATTERN: &str = r"^\d{4}-\d\d-\d\dT\d\d:\d\d:\d\d(?:[+-]\d\d:\d\d|Z)";
const LATITUDE_PATTERN: &str = r"^\d{2}°\d\d\.\d{4}′[NS]";
const LONGITUDE_PATTERN: &str = r"^\d{3}°\d\d\.\d{4}′[EW]";

/// A field that failed its structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: &'static str,
    pub reason: &'static str,
    pub value: String,
}

enum Rule {
    NonEmpty,
    Matches(Regex, &'static str),
}

/// Stateless structural checks on raw activation rows.
///
/// Patterns are anchored at the start only; trailing text is caught later by
/// the transformer.
pub struct FieldValidator {
    rules: Vec<(&'static str, Rule)>,
}

impl FieldValidator {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            rules: vec![
                ("customer_name", Rule::NonEmpty),
                ("device_name", Rule::NonEmpty),
                ("service_name", Rule::NonEmpty),
                (
                    "start_date",
                    Rule::Matches(
                        Regex::new(TIMESTAMP_PATTERN)?,
                        "expected YYYY-MM-DDTHH:MM:SS with a UTC offset",
                    ),
                ),
                (
                    "latitude",
                    Rule::Matches(Regex::new(LATITUDE_PATTERN)?, "expected DD°MM.MMMM′[NS]"),
                ),
                (
                    "longitude",
                    Rule::Matches(Regex::new(LONGITUDE_PATTERN)?, "expected DDD°MM.MMMM′[EW]"),
                ),
            ],
        })
    }

    /// All failing fields of a record; empty means the record is valid.
    pub fn failures(&self, raw: &RawRecord) -> Vec<FieldFailure> {
        self.rules
            .iter()
            .filter_map(|(field, rule)| {
                let field = *field;
                let value = raw.get(field);
                let reason = match rule {
                    Rule::NonEmpty if value.is_empty() => "must not be empty",
                    Rule::Matches(pattern, reason) if !pattern.is_match(value) => *reason,
                    _ => return None,
                };
                Some(FieldFailure {
                    field,
                    reason,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    pub fn validate(&self, raw: &RawRecord) -> Result<Activation, Vec<FieldFailure>> {
        let failures = self.failures(raw);
        if !failures.is_empty() {
            return Err(failures);
        }
        Ok(Activation {
            customer_name: raw.get("customer_name").to_string(),
            device_name: raw.get("device_name").to_string(),
            service_name: raw.get("service_name").to_string(),
            start_date: raw.get("start_date").to_string(),
            latitude: raw.get("latitude").to_string(),
            longitude: raw.get("longitude").to_string(),
        })
    }
}
