use rand::{Rng, RngCore};

use synthload_core::SchemaNode;

use crate::generators::{GeneratedValue, Generator, cycled_size, trash_string};

const TRASH_LEN: usize = 4;
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Default)]
pub struct NullGenerator;

impl Generator for NullGenerator {
    fn id(&self) -> &'static str {
        "null"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Null
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {}
}

/// Alternates `false`, `true`, ... by counter parity.
#[derive(Debug, Clone, Default)]
pub struct BoolGenerator {
    count: u64,
}

impl Generator for BoolGenerator {
    fn id(&self) -> &'static str {
        "bool"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.count += 1;
        GeneratedValue::Bool(self.count % 2 == 0)
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Monotonic counter starting at 1.
#[derive(Debug, Clone, Default)]
pub struct IntGenerator {
    count: i64,
}

impl Generator for IntGenerator {
    fn id(&self) -> &'static str {
        "integer"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.count = self.count.saturating_add(1);
        GeneratedValue::Int(self.count)
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Float mirror of [`IntGenerator`].
#[derive(Debug, Clone, Default)]
pub struct FloatGenerator {
    count: i64,
}

impl Generator for FloatGenerator {
    fn id(&self) -> &'static str {
        "number"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.count = self.count.saturating_add(1);
        GeneratedValue::Float(self.count as f64)
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Random letters whose length cycles through `[minLength, maxLength]`.
#[derive(Debug, Clone)]
pub struct TextGenerator {
    min_length: u64,
    max_length: u64,
    count: u64,
}

impl TextGenerator {
    pub fn new(node: &SchemaNode) -> Self {
        let (min_length, max_length) = node.length_bounds();
        Self {
            min_length,
            max_length,
            count: 0,
        }
    }
}

impl Generator for TextGenerator {
    fn id(&self) -> &'static str {
        "string"
    }

    fn next_value(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        self.count += 1;
        let size = cycled_size(self.count, self.min_length, self.max_length);
        let text = (0..size)
            .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
            .collect();
        GeneratedValue::Text(text)
    }

    /// Empty when a minimum applies, otherwise one character past the maximum.
    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        if self.min_length > 0 {
            GeneratedValue::Text(String::new())
        } else {
            let size = usize::try_from(self.max_length.saturating_add(1)).unwrap_or(usize::MAX);
            GeneratedValue::Text(trash_string(rng, size))
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}
