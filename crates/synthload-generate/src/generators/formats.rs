use chrono::DateTime;
use rand::RngCore;

use crate::generators::{GeneratedValue, Generator, trash_string};

const SECONDS_PER_DAY: i64 = 86_400;
const DATE_TRASH_LEN: usize = 8;
const COORDINATE_TRASH_LEN: usize = 8;

/// Successive calendar days after 1970-01-01, rendered with an explicit
/// `+00:00` offset.
#[derive(Debug, Clone, Default)]
pub struct DateTimeGenerator {
    days: i64,
}

impl Generator for DateTimeGenerator {
    fn id(&self) -> &'static str {
        "string.date-time"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.days = self.days.saturating_add(1);
        match DateTime::from_timestamp(self.days.saturating_mul(SECONDS_PER_DAY), 0) {
            Some(instant) => {
                GeneratedValue::Text(instant.format("%Y-%m-%dT%H:%M:%S+00:00").to_string())
            }
            None => GeneratedValue::Null,
        }
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, DATE_TRASH_LEN))
    }

    fn reset(&mut self) {
        self.days = 0;
    }
}

/// `DD°MM.0000′N`, minutes wrapping every 60 steps.
#[derive(Debug, Clone, Default)]
pub struct LatitudeGenerator {
    count: u64,
}

impl Generator for LatitudeGenerator {
    fn id(&self) -> &'static str {
        "string.latitude"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.count += 1;
        let (degrees, minutes) = (self.count / 60, self.count % 60);
        GeneratedValue::Text(format!("{degrees:02}°{minutes:02}.0000′N"))
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, COORDINATE_TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// `DDD°MM.0000′W`, minutes wrapping every 60 steps.
#[derive(Debug, Clone, Default)]
pub struct LongitudeGenerator {
    count: u64,
}

impl Generator for LongitudeGenerator {
    fn id(&self) -> &'static str {
        "string.longitude"
    }

    fn next_value(&mut self, _rng: &mut dyn RngCore) -> GeneratedValue {
        self.count += 1;
        let (degrees, minutes) = (self.count / 60, self.count % 60);
        GeneratedValue::Text(format!("{degrees:03}°{minutes:02}.0000′W"))
    }

    fn trash(&mut self, rng: &mut dyn RngCore) -> GeneratedValue {
        GeneratedValue::Text(trash_string(rng, COORDINATE_TRASH_LEN))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}
