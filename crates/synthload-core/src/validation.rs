use std::path::Path;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{SchemaNode, SchemaType};

const ACTIVATION_SCHEMA_JSON: &str = include_str!("../assets/activation_source.schema.json");

/// Check a document against the Draft 2020-12 meta-schema.
///
/// Compiling a validator runs the meta-schema check, so the compiled
/// validator itself is discarded.
pub fn check_schema(document: &Value) -> Result<()> {
    JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(document)
        .map(|_| ())
        .map_err(|err| Error::InvalidSchema(err.to_string()))
}

/// Parse, meta-validate and normalize a schema document.
pub fn parse_schema(contents: &str) -> Result<SchemaNode> {
    let document: Value = serde_json::from_str(contents)?;
    check_schema(&document)?;
    SchemaNode::from_value(&document)
}

/// Read and parse a schema file.
pub fn load_schema(path: &Path) -> Result<SchemaNode> {
    let contents = std::fs::read_to_string(path)?;
    parse_schema(&contents)
}

/// Raw JSON of the bundled activation source schema.
pub fn activation_schema_json() -> &'static str {
    ACTIVATION_SCHEMA_JSON
}

/// The bundled activation source schema.
pub fn activation_schema() -> Result<SchemaNode> {
    let node = parse_schema(ACTIVATION_SCHEMA_JSON)?;
    if node.schema_type != SchemaType::Object {
        return Err(Error::InvalidSchema(
            "activation schema must describe an object".to_string(),
        ));
    }
    Ok(node)
}
