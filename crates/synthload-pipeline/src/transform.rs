use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;

use crate::errors::PipelineError;
use crate::record::{LoadRecord, ResolvedActivation};

const COORDINATE_PATTERN: &str = r"^(\d+)\D(\d+\.\d+)\D(\w)";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const ZULU_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A field that passed validation but could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub field: &'static str,
    pub reason: String,
}

impl TransformFailure {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Turns resolved activations into normalized load records.
pub struct Transformer {
    coordinate: Regex,
}

impl Transformer {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            coordinate: Regex::new(COORDINATE_PATTERN)?,
        })
    }

    /// Signed decimal degrees from `D°M.M′H`. Southern and western
    /// hemispheres are negative.
    pub fn parse_coordinate(&self, text: &str) -> Option<f64> {
        let captures = self.coordinate.captures(text)?;
        let degrees: f64 = captures.get(1)?.as_str().parse().ok()?;
        let minutes: f64 = captures.get(2)?.as_str().parse().ok()?;
        let hemisphere = captures.get(3)?.as_str();
        let sign = if hemisphere.eq_ignore_ascii_case("s") || hemisphere.eq_ignore_ascii_case("w") {
            -1.0
        } else {
            1.0
        };
        Some(sign * (degrees + minutes / 60.0))
    }

    pub fn transform(&self, resolved: ResolvedActivation) -> Result<LoadRecord, TransformFailure> {
        let activation = &resolved.activation;
        let latitude = self
            .parse_coordinate(&activation.latitude)
            .ok_or_else(|| TransformFailure::new("latitude", "unparsable coordinate"))?;
        let longitude = self
            .parse_coordinate(&activation.longitude)
            .ok_or_else(|| TransformFailure::new("longitude", "unparsable coordinate"))?;
        let start_date = parse_timestamp(&activation.start_date)
            .map_err(|err| TransformFailure::new("start_date", err.to_string()))?;

        Ok(LoadRecord {
            customer_device_id: resolved.customer_device_id,
            service_id: resolved.service_id,
            start_date,
            latitude,
            longitude,
        })
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS` followed by `±HH:MM` or `Z`. Nothing may trail.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    if text.ends_with('Z') {
        return NaiveDateTime::parse_from_str(text, ZULU_FORMAT)
            .map(|naive| naive.and_utc().fixed_offset());
    }
    DateTime::parse_from_str(text, TIMESTAMP_FORMAT)
}
