//! Property value parsing shared by the sample and region readers.

use chrono::{DateTime, NaiveDateTime};

/// Timestamp layouts accepted after RFC 3339, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
];

/// Parses a signal reading from a `GeoJSON` property.
///
/// Accepts JSON numbers and numeric strings (a decimal comma is allowed,
/// since exports with `;` separators commonly use one). Returns `None`
/// for `null`, non-numeric values, and non-finite numbers.
#[must_use]
pub fn parse_reading(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// Parses a measurement timestamp.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Renders a property value as label text. Strings are used verbatim,
/// numbers and booleans via their JSON form, `null` as `None`.
#[must_use]
pub fn property_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}
