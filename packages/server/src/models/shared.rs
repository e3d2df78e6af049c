use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A single malformed request field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Upper bound for titles, names and links (stored as `varchar(255)`).
pub const MAX_TEXT_LENGTH: usize = 255;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// A decimal given either as a JSON string (`"12.99"`) or a JSON number (`12.99`).
///
/// Numbers are read from their shortest round-trip representation, so `12.99`
/// stays `12.99` instead of the nearest binary float.
struct LenientDecimal(BigDecimal);

impl<'de> Deserialize<'de> for LenientDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecimalVisitor;

        impl Visitor<'_> for DecimalVisitor {
            type Value = LenientDecimal;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal number or string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                BigDecimal::from_str(v.trim())
                    .map(LenientDecimal)
                    .map_err(|_| E::custom(format!("'{v}' is not a valid decimal")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(LenientDecimal(BigDecimal::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(LenientDecimal(BigDecimal::from(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}

/// Serde helper for a required decimal field, see [`LenientDecimal`].
pub fn decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    LenientDecimal::deserialize(deserializer).map(|d| d.0)
}

/// Serde helper for an optional decimal field; pair with `#[serde(default)]`.
pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LenientDecimal>::deserialize(deserializer)?.map(|d| d.0))
}

/// Validate a trimmed, non-empty string of at most [`MAX_TEXT_LENGTH`] characters.
pub fn validate_required_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("{field} must be 1-{MAX_TEXT_LENGTH} characters"),
        ));
    }
    Ok(())
}

/// Parse a comma-separated list of ids (`"1,2,3"`), as used by list filters.
pub fn parse_id_list(field: &'static str, raw: &str) -> Result<Vec<i32>, ValidationError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<i32>().map_err(|_| {
            ValidationError::new(field, format!("'{part}' is not a valid id"))
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
