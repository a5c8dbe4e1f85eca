use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Serialize, Serializer};

/// Surrogate identifier assigned by the reference store.
pub type SurrogateId = i64;

/// Columns written for saved records, in output order.
pub const OUTPUT_COLUMNS: [&str; 5] = [
    "customer_device_id",
    "service_id",
    "start_date",
    "latitude",
    "longitude",
];

/// A source row before validation: column name to unverified text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Text of a column; absent columns read as empty.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A record whose fields passed the structural rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub customer_name: String,
    pub device_name: String,
    pub service_name: String,
    pub start_date: String,
    pub latitude: String,
    pub longitude: String,
}

/// An activation whose natural keys all resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedActivation {
    pub activation: Activation,
    pub customer_id: SurrogateId,
    pub service_id: SurrogateId,
    pub customer_device_id: SurrogateId,
}

/// Normalized row handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRecord {
    pub customer_device_id: SurrogateId,
    pub service_id: SurrogateId,
    #[serde(serialize_with = "serialize_offset_timestamp")]
    pub start_date: DateTime<FixedOffset>,
    pub latitude: f64,
    pub longitude: f64,
}

/// RFC 3339 with whole seconds and a numeric offset; a zero offset stays
/// `+00:00` instead of `Z`.
pub fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn serialize_offset_timestamp<S: Serializer>(
    value: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(value))
}
