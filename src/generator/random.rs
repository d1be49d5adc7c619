//! Type-driven random value generators.
//!
//! Each generator produces one literal for a column's declared type:
//! - text and binary columns: alphanumeric strings of the declared size
//! - integer columns: a number within the signed/unsigned range of the width
//! - tinyint/bool columns: `0` or `1`
//! - datetime/date columns: a timestamp between 1970-12-31 and 2036-12-31
//! - json columns: `{"json":"<digits>"}`

use super::Value;
use crate::error::GenerateError;
use crate::schema::{Column, ColumnKind, ColumnType, IntWidth};
use ahash::AHashMap;
use chrono::DateTime;
use rand::{Rng, RngCore};
use std::fmt;
use std::sync::Arc;

/// Length of generated strings when the column declares no size (or zero)
pub const DEFAULT_STRING_LENGTH: usize = 100;

/// 1970-12-31 00:00:00 UTC
pub const MIN_TIMESTAMP: i64 = 31_449_600;

/// 2036-12-31 00:00:00 UTC (exclusive upper bound)
pub const MAX_TIMESTAMP: i64 = 2_114_294_400;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of digits inside generated JSON objects
const JSON_DIGITS: usize = 10;

/// Produces one value for a column of a given type
pub trait ValueGenerator: Send + Sync {
    fn generate(&self, col_type: &ColumnType, rng: &mut dyn RngCore) -> Value;
}

/// Random letters and digits, exactly `size` characters long
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphanumericGenerator;

impl ValueGenerator for AlphanumericGenerator {
    fn generate(&self, col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        let len = match col_type.size {
            Some(size) if size > 0 => size as usize,
            _ => DEFAULT_STRING_LENGTH,
        };
        (0..len)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}

/// Random integer within the range of the column's storage width
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerGenerator;

impl IntegerGenerator {
    /// Inclusive bounds for a width and signedness
    pub fn bounds(width: IntWidth, unsigned: bool) -> (i128, i128) {
        let bits = width.bits();
        if unsigned {
            (0, (1i128 << bits) - 1)
        } else {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        }
    }
}

impl ValueGenerator for IntegerGenerator {
    fn generate(&self, col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        let width = match col_type.kind {
            ColumnKind::Int(width) => width,
            _ => IntWidth::Standard,
        };
        let (lo, hi) = Self::bounds(width, col_type.unsigned);
        rng.random_range(lo..=hi).to_string()
    }
}

/// `0` or `1`
#[derive(Debug, Clone, Copy, Default)]
pub struct TinyIntGenerator;

impl ValueGenerator for TinyIntGenerator {
    fn generate(&self, _col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        let bit = if rng.random_bool(0.5) { "1" } else { "0" };
        bit.to_string()
    }
}

fn random_timestamp(rng: &mut dyn RngCore, format: &str) -> Value {
    let secs = rng.random_range(MIN_TIMESTAMP..MAX_TIMESTAMP);
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM:SS` between [`MIN_TIMESTAMP`] and [`MAX_TIMESTAMP`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeGenerator;

impl ValueGenerator for DateTimeGenerator {
    fn generate(&self, _col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        random_timestamp(rng, DATETIME_FORMAT)
    }
}

/// `YYYY-MM-DD` between [`MIN_TIMESTAMP`] and [`MAX_TIMESTAMP`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DateGenerator;

impl ValueGenerator for DateGenerator {
    fn generate(&self, _col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        random_timestamp(rng, DATE_FORMAT)
    }
}

/// Minimal JSON object wrapping a random digit string
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGenerator;

impl ValueGenerator for JsonGenerator {
    fn generate(&self, _col_type: &ColumnType, rng: &mut dyn RngCore) -> Value {
        let digits: String = (0..JSON_DIGITS)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        format!("{{\"json\":\"{}\"}}", digits)
    }
}

/// Lookup from column kind (and per-column overrides) to a generator
#[derive(Clone)]
pub struct GeneratorRegistry {
    by_kind: AHashMap<ColumnKind, Arc<dyn ValueGenerator>>,
    /// Keyed by lowercased `table.column`
    by_column: AHashMap<String, Arc<dyn ValueGenerator>>,
}

impl GeneratorRegistry {
    /// Registry with no generators at all
    pub fn empty() -> Self {
        Self {
            by_kind: AHashMap::new(),
            by_column: AHashMap::new(),
        }
    }

    /// Registry with the built-in generator for every supported kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        let text: Arc<dyn ValueGenerator> = Arc::new(AlphanumericGenerator);
        let int: Arc<dyn ValueGenerator> = Arc::new(IntegerGenerator);

        registry.register(ColumnKind::Text, text.clone());
        registry.register(ColumnKind::Binary, text);
        for width in [
            IntWidth::Small,
            IntWidth::Medium,
            IntWidth::Standard,
            IntWidth::Big,
        ] {
            registry.register(ColumnKind::Int(width), int.clone());
        }
        registry.register(ColumnKind::TinyInt, Arc::new(TinyIntGenerator));
        registry.register(ColumnKind::DateTime, Arc::new(DateTimeGenerator));
        registry.register(ColumnKind::Date, Arc::new(DateGenerator));
        registry.register(ColumnKind::Json, Arc::new(JsonGenerator));
        registry
    }

    /// Set the generator for a column kind, replacing any previous one
    pub fn register(&mut self, kind: ColumnKind, generator: Arc<dyn ValueGenerator>) {
        self.by_kind.insert(kind, generator);
    }

    /// Set the generator for one column (`table.column`, case-insensitive)
    pub fn register_column(&mut self, full_name: &str, generator: Arc<dyn ValueGenerator>) {
        self.by_column.insert(full_name.to_lowercase(), generator);
    }

    /// Whether a column has its own generator
    pub fn has_override(&self, full_name: &str) -> bool {
        self.by_column.contains_key(&full_name.to_lowercase())
    }

    /// Whether a column kind can be generated
    pub fn supports(&self, kind: &ColumnKind) -> bool {
        self.by_kind.contains_key(kind)
    }

    /// Generator for a column: its override if any, else the one for its kind
    pub fn generator_for(&self, column: &Column) -> Result<&dyn ValueGenerator, GenerateError> {
        if let Some(generator) = self.by_column.get(&column.full_name.to_lowercase()) {
            return Ok(generator.as_ref());
        }
        self.by_kind
            .get(&column.col_type.kind)
            .map(|g| g.as_ref())
            .ok_or_else(|| GenerateError::UnsupportedColumnType {
                column: column.full_name.clone(),
                col_type: column.col_type.to_string(),
            })
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .field("columns", &self.by_column.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_timestamp_bounds() {
        let min = NaiveDate::from_ymd_opt(1970, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        let max = NaiveDate::from_ymd_opt(2036, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        assert_eq!(MIN_TIMESTAMP, min);
        assert_eq!(MAX_TIMESTAMP, max);
    }

    #[test]
    fn test_datetime_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let col_type = ColumnType::new(ColumnKind::DateTime);
        for _ in 0..200 {
            let value = DateTimeGenerator.generate(&col_type, &mut rng);
            let parsed = NaiveDateTime::parse_from_str(&value, DATETIME_FORMAT).unwrap();
            let secs = parsed.and_utc().timestamp();
            assert!((MIN_TIMESTAMP..MAX_TIMESTAMP).contains(&secs), "{}", value);
        }
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(
            IntegerGenerator::bounds(IntWidth::Small, false),
            (-32768, 32767)
        );
        assert_eq!(IntegerGenerator::bounds(IntWidth::Small, true), (0, 65535));
        assert_eq!(
            IntegerGenerator::bounds(IntWidth::Big, false),
            (i64::MIN as i128, i64::MAX as i128)
        );
        assert_eq!(
            IntegerGenerator::bounds(IntWidth::Big, true),
            (0, u64::MAX as i128)
        );
    }

    #[test]
    fn test_json_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let value = JsonGenerator.generate(&ColumnType::new(ColumnKind::Json), &mut rng);
        let parsed: serde_json::Value = serde_json::from_str(&value).unwrap();
        let digits = parsed["json"].as_str().unwrap();
        assert_eq!(digits.len(), JSON_DIGITS);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
