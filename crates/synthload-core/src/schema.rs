use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const DEFAULT_MIN_LENGTH: u64 = 0;
pub const DEFAULT_MAX_LENGTH: u64 = 12;
pub const DEFAULT_MIN_ITEMS: u64 = 1;
pub const DEFAULT_MAX_ITEMS: u64 = 10;
/// Largest accepted `minLength`/`maxLength`/`minItems`/`maxItems`.
pub const MAX_BOUND: u64 = 65_536;

/// Primitive JSON Schema types understood by the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SchemaType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Value of the `format` keyword.
///
/// Unrecognized formats are preserved so the generator factory can name them
/// when it refuses the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFormat {
    DateTime,
    Latitude,
    Longitude,
    Other(String),
}

impl SchemaFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "date-time" => Self::DateTime,
            "latitude" => Self::Latitude,
            "longitude" => Self::Longitude,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DateTime => "date-time",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Other(name) => name.as_str(),
        }
    }
}

/// Normalized, immutable view of one schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub schema_type: SchemaType,
    pub title: Option<String>,
    pub format: Option<SchemaFormat>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub items: Option<Box<SchemaNode>>,
    /// Declared properties in document order.
    pub properties: Vec<(String, SchemaNode)>,
}

impl SchemaNode {
    /// Build a node tree from a JSON Schema document.
    ///
    /// This does not check the document against the meta-schema; use
    /// [`crate::parse_schema`] for untrusted input.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_value_at(value, "")
    }

    fn from_value_at(value: &Value, path: &str) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid(path, "schema node must be an object"))?;

        let schema_type = match object.get("type") {
            Some(Value::String(name)) => SchemaType::parse(name)
                .ok_or_else(|| invalid(path, &format!("unknown type '{name}'")))?,
            Some(Value::Array(_)) => {
                return Err(invalid(path, "type unions are not supported"));
            }
            Some(_) => return Err(invalid(path, "type must be a string")),
            None => return Err(invalid(path, "missing type")),
        };

        let format = match object.get("format") {
            Some(Value::String(name)) => Some(SchemaFormat::parse(name)),
            Some(_) => return Err(invalid(path, "format must be a string")),
            None => None,
        };

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);

        let items = match (schema_type, object.get("items")) {
            (SchemaType::Array, Some(items)) => Some(Box::new(Self::from_value_at(
                items,
                &format!("{path}/items"),
            )?)),
            (SchemaType::Array, None) => {
                return Err(invalid(path, "array schema requires items"));
            }
            _ => None,
        };

        let mut properties = Vec::new();
        if schema_type == SchemaType::Object {
            if let Some(declared) = object.get("properties") {
                let declared = declared
                    .as_object()
                    .ok_or_else(|| invalid(path, "properties must be an object"))?;
                for (name, node) in declared {
                    let child = Self::from_value_at(node, &format!("{path}/properties/{name}"))?;
                    properties.push((name.clone(), child));
                }
            }
        }

        let node = Self {
            schema_type,
            title,
            format,
            min_length: bound(object, "minLength", path)?,
            max_length: bound(object, "maxLength", path)?,
            min_items: bound(object, "minItems", path)?,
            max_items: bound(object, "maxItems", path)?,
            items,
            properties,
        };

        if node.length_bounds().0 > node.length_bounds().1 {
            return Err(invalid(path, "minLength must be <= maxLength"));
        }
        if node.item_bounds().0 > node.item_bounds().1 {
            return Err(invalid(path, "minItems must be <= maxItems"));
        }

        Ok(node)
    }

    /// Effective `(minLength, maxLength)` with generator defaults applied,
    /// clamped to [`MAX_BOUND`].
    pub fn length_bounds(&self) -> (u64, u64) {
        let min = self.min_length.unwrap_or(DEFAULT_MIN_LENGTH).min(MAX_BOUND);
        let max = self.max_length.unwrap_or(DEFAULT_MAX_LENGTH.max(min));
        (min, max.min(MAX_BOUND))
    }

    /// Effective `(minItems, maxItems)` with generator defaults applied,
    /// clamped to [`MAX_BOUND`].
    pub fn item_bounds(&self) -> (u64, u64) {
        let min = self.min_items.unwrap_or(DEFAULT_MIN_ITEMS).min(MAX_BOUND);
        let max = self.max_items.unwrap_or(DEFAULT_MAX_ITEMS.max(min));
        (min, max.min(MAX_BOUND))
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, node)| node)
    }
}

fn bound(object: &Map<String, Value>, key: &str, path: &str) -> Result<Option<u64>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => {
            let bound = value
                .as_u64()
                .ok_or_else(|| invalid(path, &format!("{key} must be a non-negative integer")))?;
            if bound > MAX_BOUND {
                return Err(invalid(path, &format!("{key} must not exceed {MAX_BOUND}")));
            }
            Ok(Some(bound))
        }
    }
}

fn invalid(path: &str, message: &str) -> Error {
    let path = if path.is_empty() { "/" } else { path };
    Error::InvalidSchema(format!("{path}: {message}"))
}
