use rand::RngCore;

use synthload_core::SchemaNode;

use crate::errors::GenerationError;
use crate::generators::{
    GeneratedValue, Generator, Record, ValueGenerator, cycled_size, trash_string,
};

const TRASH_LEN: usize = 4;

/// Lists whose size cycles through `[minItems, maxItems]`, every element
/// drawn from the same item generator.
#[derive(Debug, Clone)]
pub struct ArrayGenerator {
    items: Box<ValueGenerator>,
    min_items: u64,
    max_items: u64,
    count: u64,
}

impl ArrayGenerator {
    pub fn from_schema(node: &SchemaNode) -> Result<Self, GenerationError> {
        let items = node.items.as_deref().ok_or_else(|| {
            GenerationError::Unsupported("array schema requires items".to_string())
        })?;
        let (min_items, max_items) = node.item_bounds();
        Ok(Self {
            items: Box::new(ValueGenerator::from_schema(items)?),
            min_items,
            max_items,
            count: 0,
        })
    }
}

impl Generator for ArrayGenerator {
    fn id(&self) -> &'static str {
        "array"
    }

    fn next_value(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        self.count += 1;
        let size = cycled_size(self.count, self.min_items, self.max_items);
        let values = (0..size).map(|_| self.items.next_value(rng)).collect();
        GeneratedValue::List(values)
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
        self.items.reset();
    }
}

/// One generator per declared property, advanced together once per record.
#[derive(Debug, Clone)]
pub struct ObjectGenerator {
    properties: Vec<(String, ValueGenerator)>,
}

impl ObjectGenerator {
    pub fn from_schema(node: &SchemaNode) -> Result<Self, GenerationError> {
        let properties = node
            .properties
            .iter()
            .map(|(name, child)| {
                ValueGenerator::from_schema(child)
                    .map(|generator| (name.clone(), generator))
                    .map_err(|err| match err {
                        GenerationError::Unsupported(message) => {
                            GenerationError::Unsupported(format!("{name}: {message}"))
                        }
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { properties })
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut ValueGenerator> {
        self.properties
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, generator)| generator)
    }

    pub fn next_record(&mut self, rng: &mut dyn RngCore) -> Record {
        let mut record = Record::new();
        for (name, generator) in &mut self.properties {
            record.push(name.clone(), generator.next_value(rng));
        }
        record
    }
}

impl Generator for ObjectGenerator {
    fn id(&self) -> &'static str {
        "object"
    }

    fn next_value(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Object(self.next_record(rng))
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {
        for (_, generator) in &mut self.properties {
            generator.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    #[test]
    fn array_elements_progress_across_calls() {
        let node = SchemaNode::from_value(&json!({
            "type": "array",
            "items": {"type": "integer"},
            "minItems": 1,
            "maxItems": 2
        }))
        .expect("parse");
        let mut generator = ArrayGenerator::from_schema(&node).expect("generator");
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let first = generator.next_value(&mut rng);
        let second = generator.next_value(&mut rng);
        assert_eq!(
            first,
            GeneratedValue::List(vec![GeneratedValue::Int(1), GeneratedValue::Int(2)])
        );
        assert_eq!(second, GeneratedValue::List(vec![GeneratedValue::Int(3)]));
    }

    #[test]
    fn object_advances_each_property_once() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}, "flag": {"type": "boolean"}}
        }))
        .expect("parse");
        let mut generator = ObjectGenerator::from_schema(&node).expect("generator");
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let first = generator.next_record(&mut rng);
        let second = generator.next_record(&mut rng);
        assert_eq!(first.get("id"), Some(&GeneratedValue::Int(1)));
        assert_eq!(first.get("flag"), Some(&GeneratedValue::Bool(false)));
        assert_eq!(second.get("id"), Some(&GeneratedValue::Int(2)));
        assert_eq!(second.get("flag"), Some(&GeneratedValue::Bool(true)));

        generator.reset();
        let restarted = generator.next_record(&mut rng);
        assert_eq!(restarted.get("id"), Some(&GeneratedValue::Int(1)));
    }

    #[test]
    fn unsupported_property_names_the_field() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {"site": {"type": "string", "format": "uri"}}
        }))
        .expect("parse");
        let err = ObjectGenerator::from_schema(&node).unwrap_err();
        assert!(err.to_string().contains("site"));
    }
}
