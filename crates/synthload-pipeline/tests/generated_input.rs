use synthload_core::activation_schema;
use synthload_generate::{FaultInjector, Record, RecordAssembler};
use synthload_pipeline::{
    FieldValidator, InMemoryReferenceStore, MemorySink, Pipeline, RawRecord, Transformer,
};

fn to_raw(record: &Record) -> RawRecord {
    RawRecord::from_pairs(record.iter().map(|(name, value)| (name, value.to_csv())))
}

fn assembler(seed: u64) -> RecordAssembler {
    let schema = activation_schema().expect("schema");
    RecordAssembler::new(&schema, seed).expect("assembler")
}

#[test]
fn generated_rows_pass_field_validation() {
    let validator = FieldValidator::new().expect("validator");
    for record in assembler(42).take(200) {
        let raw = to_raw(&record);
        assert!(
            validator.failures(&raw).is_empty(),
            "generated row rejected: {raw:?}"
        );
    }
}

#[test]
fn trash_values_fail_their_field_rule() {
    let validator = FieldValidator::new().expect("validator");
    let mut assembler = assembler(42);
    let trash_rows = FaultInjector::new(&mut assembler).trash_rows();

    for injected in trash_rows {
        // device_type_name is carried but has no field rule.
        if injected.property == "device_type_name" {
            continue;
        }
        let failing: Vec<&str> = validator
            .failures(&to_raw(&injected.record))
            .into_iter()
            .map(|failure| failure.field)
            .collect();
        assert_eq!(
            failing,
            vec![injected.property.as_str()],
            "trash for {} should fail only that field",
            injected.property
        );
    }
}

#[test]
fn generated_coordinates_round_trip() {
    let transformer = Transformer::new().expect("transformer");
    for (index, record) in assembler(7).take(500).enumerate() {
        let step = (index + 1) as f64;
        let expected = (step / 60.0).floor() + (step % 60.0) / 60.0;

        let latitude = record
            .get("latitude")
            .and_then(|value| value.as_str())
            .expect("latitude text");
        let longitude = record
            .get("longitude")
            .and_then(|value| value.as_str())
            .expect("longitude text");

        let lat = transformer.parse_coordinate(latitude).expect("parse latitude");
        let lon = transformer.parse_coordinate(longitude).expect("parse longitude");
        assert!((lat - expected).abs() < 1e-9, "{latitude} -> {lat}");
        assert!((lon + expected).abs() < 1e-9, "{longitude} -> {lon}");
    }
}

#[test]
fn generated_dataset_loads_against_its_own_references() {
    let mut assembler = assembler(3);
    let good: Vec<Record> = assembler.by_ref().take(20).collect();
    let faulty = FaultInjector::new(&mut assembler).all_rows();

    let mut store = InMemoryReferenceStore::new();
    for (index, record) in good.iter().enumerate() {
        let raw = to_raw(record);
        let id = index as i64 + 1;
        store.add_customer(raw.get("customer_name"), id);
        store.add_service(raw.get("service_name"), id);
        store.add_customer_device(raw.get("customer_name"), raw.get("device_name"), id);
    }

    let batch: Vec<RawRecord> = good
        .iter()
        .map(to_raw)
        .chain(faulty.iter().map(|injected| to_raw(&injected.record)))
        .collect();
    let total = batch.len() as u64;

    let mut pipeline = Pipeline::new(store, MemorySink::new()).expect("pipeline");
    let report = pipeline.run(batch).expect("run");
    let counts = report.counts;

    assert_eq!(counts.raw, total);
    assert!(counts.is_balanced());
    assert_eq!(counts.saved, 20);
    // Six validated fields, each blanked once and trashed once.
    assert_eq!(counts.invalid, 12);
    // Blanking or trashing device_type_name leaves a field-valid row whose
    // fresh names are not in the store.
    assert_eq!(counts.invalid_references, 2);
}
