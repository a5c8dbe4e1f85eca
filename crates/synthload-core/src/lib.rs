//! Core contracts shared by the synthload crates.
//!
//! Defines the normalized schema model that drives record generation and the
//! JSON Schema loading helpers that reject malformed documents before any
//! generator is built.

pub mod error;
pub mod schema;
pub mod validation;

pub use error::{Error, Result};
pub use schema::{
    DEFAULT_MAX_ITEMS, DEFAULT_MAX_LENGTH, DEFAULT_MIN_ITEMS, DEFAULT_MIN_LENGTH, MAX_BOUND,
    SchemaFormat, SchemaNode, SchemaType,
};
pub use validation::{
    activation_schema, activation_schema_json, check_schema, load_schema, parse_schema,
};
