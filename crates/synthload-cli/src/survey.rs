use std::collections::HashSet;

use synthload_core::{SchemaNode, SchemaType};
use synthload_pipeline::{FieldValidator, RawRecord};
use tracing::warn;

/// Distinct reference names seen in field-valid rows, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSeed {
    pub customers: Vec<String>,
    pub device_types: Vec<String>,
    /// `(customer_name, device_name, device_type_name)`.
    pub customer_devices: Vec<(String, String, String)>,
    pub services: Vec<String>,
}

impl ReferenceSeed {
    /// Drop the first customer, customer device and service so that rows
    /// naming them fail reference resolution on load.
    pub fn withhold_first(&mut self) {
        let withheld = if self.customers.is_empty() {
            None
        } else {
            Some(self.customers.remove(0))
        };
        if !self.services.is_empty() {
            self.services.remove(0);
        }
        if !self.customer_devices.is_empty() {
            self.customer_devices.remove(0);
        }
        // Devices of the withheld customer have no owner row to point at.
        self.customer_devices
            .retain(|(customer, _, _)| Some(customer) != withheld.as_ref());
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty() && self.services.is_empty()
    }
}

/// Declared `minLength`/`maxLength` of one string property.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LengthRule {
    field: String,
    min: Option<u64>,
    max: Option<u64>,
}

impl LengthRule {
    fn admits(&self, value: &str) -> bool {
        let length = value.chars().count() as u64;
        self.min.is_none_or(|min| length >= min) && self.max.is_none_or(|max| length <= max)
    }
}

/// Collects reference names from a stream of raw rows.
pub struct Survey {
    validator: FieldValidator,
    lengths: Vec<LengthRule>,
    seed: ReferenceSeed,
    seen_customers: HashSet<String>,
    seen_device_types: HashSet<String>,
    seen_customer_devices: HashSet<(String, String)>,
    seen_services: HashSet<String>,
    skipped: u64,
}

impl Survey {
    /// Rows are also held to the declared string lengths of `schema`.
    pub fn new(validator: FieldValidator, schema: &SchemaNode) -> Self {
        let lengths = schema
            .properties
            .iter()
            .filter(|(_, node)| node.schema_type == SchemaType::String)
            .filter(|(_, node)| node.min_length.is_some() || node.max_length.is_some())
            .map(|(field, node)| LengthRule {
                field: field.clone(),
                min: node.min_length,
                max: node.max_length,
            })
            .collect();
        Self {
            validator,
            lengths,
            seed: ReferenceSeed::default(),
            seen_customers: HashSet::new(),
            seen_device_types: HashSet::new(),
            seen_customer_devices: HashSet::new(),
            seen_services: HashSet::new(),
            skipped: 0,
        }
    }

    /// Rows failing a field rule or a length bound, or without a device
    /// type, are skipped.
    pub fn observe(&mut self, raw: &RawRecord) {
        let failures = self.validator.failures(raw);
        let out_of_bounds: Vec<&str> = self
            .lengths
            .iter()
            .filter(|rule| !rule.admits(raw.get(&rule.field)))
            .map(|rule| rule.field.as_str())
            .collect();
        let device_type = raw.get("device_type_name");
        if !failures.is_empty() || !out_of_bounds.is_empty() || device_type.is_empty() {
            self.skipped += 1;
            let fields: Vec<&str> = failures.iter().map(|failure| failure.field).collect();
            warn!(
                fields = ?fields,
                out_of_bounds = ?out_of_bounds,
                device_type_missing = device_type.is_empty(),
                "survey skipped row"
            );
            return;
        }

        let customer = raw.get("customer_name");
        let device = raw.get("device_name");
        let service = raw.get("service_name");

        if self.seen_customers.insert(customer.to_string()) {
            self.seed.customers.push(customer.to_string());
        }
        if self.seen_device_types.insert(device_type.to_string()) {
            self.seed.device_types.push(device_type.to_string());
        }
        // A device belongs to the first type it was seen with.
        if self
            .seen_customer_devices
            .insert((customer.to_string(), device.to_string()))
        {
            self.seed.customer_devices.push((
                customer.to_string(),
                device.to_string(),
                device_type.to_string(),
            ));
        }
        if self.seen_services.insert(service.to_string()) {
            self.seed.services.push(service.to_string());
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn finish(self) -> ReferenceSeed {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use synthload_core::activation_schema;

    use super::*;

    fn row(customer: &str, device: &str, device_type: &str, service: &str) -> RawRecord {
        RawRecord::from_pairs([
            ("customer_name", customer),
            ("device_name", device),
            ("device_type_name", device_type),
            ("service_name", service),
            ("start_date", "2022-07-10T11:12:13+00:00"),
            ("latitude", "35°21.2833′N"),
            ("longitude", "082°31.6333′W"),
        ])
    }

    fn survey(rows: &[RawRecord]) -> (ReferenceSeed, u64) {
        let schema = activation_schema().expect("schema");
        let mut survey = Survey::new(FieldValidator::new().expect("validator"), &schema);
        for raw in rows {
            survey.observe(raw);
        }
        let skipped = survey.skipped();
        (survey.finish(), skipped)
    }

    #[test]
    fn collects_distinct_names_in_order() {
        let (seed, skipped) = survey(&[
            row("Jones", "phone", "mobile", "voice"),
            row("Smith", "tablet", "pad", "data"),
            row("Jones", "phone", "mobile", "data"),
            row("Jones", "watch", "mobile", "voice"),
        ]);
        assert_eq!(skipped, 0);
        assert_eq!(seed.customers, vec!["Jones", "Smith"]);
        assert_eq!(seed.device_types, vec!["mobile", "pad"]);
        assert_eq!(seed.services, vec!["voice", "data"]);
        assert_eq!(seed.customer_devices.len(), 3);
        assert_eq!(
            seed.customer_devices[2],
            ("Jones".to_string(), "watch".to_string(), "mobile".to_string())
        );
    }

    #[test]
    fn invalid_rows_contribute_nothing() {
        let mut bad_latitude = row("Brown", "phone", "mobile", "fax");
        bad_latitude.insert("latitude", "north");
        let (seed, skipped) = survey(&[bad_latitude, row("Green", "phone", "", "voice")]);
        assert_eq!(skipped, 2);
        assert!(seed.is_empty());
    }

    #[test]
    fn names_past_the_schema_length_are_skipped() {
        let long_customer = "C".repeat(65);
        let (seed, skipped) = survey(&[
            row(&long_customer, "phone", "mobile", "voice"),
            row("Jones", "phone", "handset9", "voice"),
            row("Jones", "phone", "handset99", "voice"),
            row("Smith", "a-very-long-device", "mobile", "voice"),
        ]);
        assert_eq!(skipped, 3);
        assert_eq!(seed.customers, vec!["Jones"]);
        assert_eq!(seed.device_types, vec!["handset9"]);
    }

    #[test]
    fn length_rule_counts_characters() {
        let rule = LengthRule {
            field: "latitude".to_string(),
            min: None,
            max: Some(12),
        };
        assert!(rule.admits("35°21.2833′N"));
        assert!(!rule.admits("35°21.28333′N"));
    }

    #[test]
    fn withholding_drops_first_names_and_their_devices() {
        let (mut seed, _) = survey(&[
            row("Jones", "phone", "mobile", "voice"),
            row("Smith", "tablet", "pad", "data"),
            row("Smith", "phone", "mobile", "voice"),
        ]);
        seed.withhold_first();
        assert_eq!(seed.customers, vec!["Smith"]);
        assert_eq!(seed.services, vec!["data"]);
        assert_eq!(
            seed.customer_devices,
            vec![
                ("Smith".to_string(), "tablet".to_string(), "pad".to_string()),
                ("Smith".to_string(), "phone".to_string(), "mobile".to_string()),
            ]
        );
    }
}
