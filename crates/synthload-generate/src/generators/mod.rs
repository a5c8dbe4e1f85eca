use rand::{Rng, RngCore};
use serde_json::Value;

use synthload_core::{SchemaFormat, SchemaNode, SchemaType};

use crate::errors::GenerationError;

pub mod composite;
pub mod formats;
pub mod primitives;

pub use composite::{ArrayGenerator, ObjectGenerator};
pub use formats::{DateTimeGenerator, LatitudeGenerator, LongitudeGenerator};
pub use primitives::{BoolGenerator, FloatGenerator, IntGenerator, NullGenerator, TextGenerator};

/// Printable ASCII without whitespace control characters.
const PRINTABLE: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ ";

/// Generated value for a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<GeneratedValue>),
    Object(Record),
}

impl GeneratedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Render as a single CSV cell. Nested values are written as compact JSON.
    pub fn to_csv(&self) -> String {
        match self {
            GeneratedValue::Null => String::new(),
            GeneratedValue::Bool(value) => value.to_string(),
            GeneratedValue::Int(value) => value.to_string(),
            GeneratedValue::Float(value) => format!("{value:?}"),
            GeneratedValue::Text(value) => value.clone(),
            GeneratedValue::List(_) | GeneratedValue::Object(_) => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            GeneratedValue::Null => Value::Null,
            GeneratedValue::Bool(value) => Value::Bool(*value),
            GeneratedValue::Int(value) => Value::from(*value),
            GeneratedValue::Float(value) => Value::from(*value),
            GeneratedValue::Text(value) => Value::String(value.clone()),
            GeneratedValue::List(values) => {
                Value::Array(values.iter().map(GeneratedValue::to_json).collect())
            }
            GeneratedValue::Object(record) => Value::Object(
                record
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Ordered mapping from field name to generated value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, GeneratedValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: GeneratedValue) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&GeneratedValue> {
        self.fields
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    /// Replace the value of an existing field. Returns false when the field is absent.
    pub fn set(&mut self, name: &str, value: GeneratedValue) -> bool {
        match self.fields.iter_mut().find(|(candidate, _)| candidate == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeneratedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// CSV cells in `header` order; absent fields become empty cells.
    pub fn to_csv_row(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|name| self.get(name).map(GeneratedValue::to_csv).unwrap_or_default())
            .collect()
    }
}

/// A stateful value source bound to one schema node.
///
/// `next_value` advances the internal cursor; `trash` produces a value that
/// the node's validation rule must reject. The run-wide RNG is passed in so
/// that reseeding one RNG reproduces the whole run.
pub trait Generator {
    fn id(&self) -> &'static str;

    fn next_value(&mut self, rng: &mut dyn RngCore) -> GeneratedValue;

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue;

    /// Rewind the cursor to its initial position.
    fn reset(&mut self);
}

/// Closed set of generator variants, one per supported `(type, format)`.
#[derive(Debug, Clone)]
pub enum ValueGenerator {
    Null(NullGenerator),
    Bool(BoolGenerator),
    Int(IntGenerator),
    Float(FloatGenerator),
    Text(TextGenerator),
    DateTime(DateTimeGenerator),
    Latitude(LatitudeGenerator),
    Longitude(LongitudeGenerator),
    Array(ArrayGenerator),
    Object(ObjectGenerator),
}

impl ValueGenerator {
    /// Select the variant for a schema node, failing on combinations that
    /// have no generator.
    pub fn from_schema(node: &SchemaNode) -> Result<Self, GenerationError> {
        let generator = match (node.schema_type, node.format.as_ref()) {
            (SchemaType::Null, None) => Self::Null(NullGenerator),
            (SchemaType::Boolean, None) => Self::Bool(BoolGenerator::default()),
            (SchemaType::Integer, None) => Self::Int(IntGenerator::default()),
            (SchemaType::Number, None) => Self::Float(FloatGenerator::default()),
            (SchemaType::String, None) => Self::Text(TextGenerator::new(node)),
            (SchemaType::String, Some(SchemaFormat::DateTime)) => {
                Self::DateTime(DateTimeGenerator::default())
            }
            (SchemaType::String, Some(SchemaFormat::Latitude)) => {
                Self::Latitude(LatitudeGenerator::default())
            }
            (SchemaType::String, Some(SchemaFormat::Longitude)) => {
                Self::Longitude(LongitudeGenerator::default())
            }
            (SchemaType::Array, None) => Self::Array(ArrayGenerator::from_schema(node)?),
            (SchemaType::Object, None) => Self::Object(ObjectGenerator::from_schema(node)?),
            (schema_type, Some(format)) => {
                return Err(GenerationError::Unsupported(format!(
                    "format '{}' is not supported for type '{}'",
                    format.as_str(),
                    schema_type.as_str()
                )));
            }
        };
        Ok(generator)
    }

    fn inner(&self) -> &dyn Generator {
        match self {
            Self::Null(generator) => generator,
            Self::Bool(generator) => generator,
            Self::Int(generator) => generator,
            Self::Float(generator) => generator,
            Self::Text(generator) => generator,
            Self::DateTime(generator) => generator,
            Self::Latitude(generator) => generator,
            Self::Longitude(generator) => generator,
            Self::Array(generator) => generator,
            Self::Object(generator) => generator,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Generator {
        match self {
            Self::Null(generator) => generator,
            Self::Bool(generator) => generator,
            Self::Int(generator) => generator,
            Self::Float(generator) => generator,
            Self::Text(generator) => generator,
            Self::DateTime(generator) => generator,
            Self::Latitude(generator) => generator,
            Self::Longitude(generator) => generator,
            Self::Array(generator) => generator,
            Self::Object(generator) => generator,
        }
    }
}

impl Generator for ValueGenerator {
    fn id(&self) -> &'static str {
        self.inner().id()
    }

    fn next_value(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        self.inner_mut().next_value(rng)
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        self.inner_mut().trash(rng)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}

/// Random printable text, used wherever a wrong-typed value should slip through.
pub fn trash_string(rng: &mut dyn RngCore, size: usize) -> String {
    (0..size)
        .map(|_| PRINTABLE[rng.random_range(0..PRINTABLE.len())] as char)
        .collect()
}

/// Length of the `count`-th value when cycling through `[min, max]` inclusive.
pub(crate) fn cycled_size(count: u64, min: u64, max: u64) -> u64 {
    let span = max.saturating_sub(min).saturating_add(1);
    min + count % span
}
