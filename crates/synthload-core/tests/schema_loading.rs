use std::fs;
use std::path::PathBuf;

use synthload_core::{
    Error, SchemaFormat, SchemaType, activation_schema, load_schema, parse_schema,
};

#[test]
fn bundled_activation_schema_parses() {
    let schema = activation_schema().expect("bundled schema");

    assert_eq!(schema.schema_type, SchemaType::Object);
    assert_eq!(schema.title.as_deref(), Some("Activation"));
    assert_eq!(
        schema.property_names(),
        vec![
            "customer_name",
            "device_name",
            "device_type_name",
            "service_name",
            "start_date",
            "latitude",
            "longitude",
        ]
    );

    let start_date = schema.property("start_date").expect("start_date");
    assert_eq!(start_date.format, Some(SchemaFormat::DateTime));
    let customer = schema.property("customer_name").expect("customer_name");
    assert_eq!(customer.length_bounds(), (1, 64));
}

#[test]
fn meta_schema_violation_fails_fast() {
    let err = parse_schema(r#"{"type": 12}"#).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema(_)), "got {err:?}");

    let err = parse_schema(r#"{"type": "string", "minLength": -3}"#).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema(_)), "got {err:?}");
}

#[test]
fn draft_2020_12_keyword_types_are_enforced() {
    for document in [
        r#"{"type": "object", "title": 5}"#,
        r#"{"type": "object", "$comment": 5}"#,
        r#"{"type": "string", "format": 5}"#,
    ] {
        let err = parse_schema(document).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)), "{document}: got {err:?}");
    }
}

#[test]
fn oversized_bounds_are_rejected() {
    let err = parse_schema(r#"{"type": "string", "maxLength": 9223372036854775807}"#).unwrap_err();
    assert!(err.to_string().contains("maxLength"), "got {err}");

    let err = parse_schema(
        r#"{"type": "array", "items": {"type": "integer"}, "maxItems": 18446744073709551615}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("maxItems"), "got {err}");
}

#[test]
fn malformed_json_is_reported() {
    let err = parse_schema("{not json").unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn load_schema_reads_file() {
    let mut path = std::env::temp_dir();
    path.push(format!("synthload_schema_{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {"id": {"type": "integer"}, "tags": {"type": "array", "items": {"type": "string"}, "maxItems": 3}}
        }"#,
    )
    .expect("write schema");

    let schema = load_schema(&path).expect("load schema");
    let tags = schema.property("tags").expect("tags");
    assert_eq!(tags.item_bounds(), (1, 3));
    assert_eq!(
        tags.items.as_ref().map(|items| items.schema_type),
        Some(SchemaType::String)
    );

    fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_io_error() {
    let err = load_schema(&PathBuf::from("/nonexistent/synthload.schema.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
