//! Timestamp-relative parameterization of task documents.
//!
//! A task document carries a `created` timestamp and any number of other
//! timestamps (deadline, expires, ...) that are meaningful only relative to
//! it. Parameterizing a document moves all of them forward by the time that
//! elapsed since `created`, so a stored draft can be submitted again with
//! fresh deadlines.

use chrono::{DateTime, Datelike, Duration, DurationRound, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::error::ParseError;

static ISO_8601: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("timestamp pattern compiles")
});

/// Whether a string is treated as a timestamp.
pub fn is_timestamp(value: &str) -> bool {
    ISO_8601.is_match(value)
}

/// Parse an ISO-8601 timestamp, truncated to millisecond precision.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|source| ParseError::Timestamp {
        value: value.to_string(),
        source,
    })?;
    parsed
        .with_timezone(&Utc)
        .duration_trunc(Duration::milliseconds(1))
        .map_err(|_| ParseError::OutOfRange(value.to_string()))
}

/// Format a timestamp as `YYYY-MM-DDTHH:mm:ss.sssZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds elapsed between `reference` and `now`. Negative when the
/// reference lies in the future.
pub fn offset(reference: &str, now: DateTime<Utc>) -> Result<Duration, ParseError> {
    let reference = parse_timestamp(reference)?;
    Ok(Duration::milliseconds((now - reference).num_milliseconds()))
}

/// The `created` timestamp of a task document.
pub fn reference_timestamp(document: &Value) -> Result<&str, ParseError> {
    document
        .get("created")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingCreated)
}

/// Shift every timestamp in `document` by the time elapsed since `reference`
/// and serialize the result.
pub fn parameterize(
    document: &Value,
    reference: &str,
    now: DateTime<Utc>,
) -> Result<String, ParseError> {
    let offset = offset(reference, now)?;
    let shifted = shift(document, offset)?;
    tracing::debug!(offset_ms = offset.num_milliseconds(), "parameterized task document");
    Ok(serde_yaml::to_string(&shifted)?)
}

/// Parameterize a document relative to its own `created` field.
pub fn parameterize_task(document: &Value, now: DateTime<Utc>) -> Result<String, ParseError> {
    let reference = reference_timestamp(document)?;
    parameterize(document, reference, now)
}

/// Parse YAML text and parameterize it relative to its `created` field.
pub fn parameterize_text(text: &str, now: DateTime<Utc>) -> Result<String, ParseError> {
    let document: Value = serde_yaml::from_str(text)?;
    parameterize_task(&document, now)
}

/// Return a copy of `value` with every timestamp string moved by `offset`.
/// A timestamp moved outside of four-digit years is `ParseError::OutOfRange`.
pub fn shift(value: &Value, offset: Duration) -> Result<Value, ParseError> {
    match value {
        Value::Mapping(map) => {
            let mut shifted = Mapping::with_capacity(map.len());
            for (key, value) in map {
                shifted.insert(key.clone(), shift(value, offset)?);
            }
            Ok(Value::Mapping(shifted))
        }
        Value::Sequence(items) => items
            .iter()
            .map(|item| shift(item, offset))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Tagged(tagged) => Ok(Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: shift(&tagged.value, offset)?,
        }))),
        Value::String(text) if is_timestamp(text) => {
            let at = parse_timestamp(text)?;
            let moved = at
                .checked_add_signed(offset)
                .filter(|moved| (0..=9999).contains(&moved.year()))
                .ok_or_else(|| ParseError::OutOfRange(text.clone()))?;
            Ok(Value::String(format_timestamp(moved)))
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => Ok(value.clone()),
    }
}
