//! Decoding of raw runtime output into typed values.
//!
//! Each decoder accepts exactly one output shape and fails with a
//! [`DecodeError`] carrying the offending fragment rather than falling back to
//! a default. Empty output is only accepted where an empty collection is a
//! legitimate answer (list-style verbs).

mod records;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use records::{ImageInspectRecord, ImageRecord, Names, PsRecord};

use crate::error::DecodeError;
use crate::model::InspectRecord;

/// Decode newline-delimited identifiers.
///
/// Blank output yields an empty vector. Surrounding whitespace and blank lines
/// are ignored.
///
/// # Errors
///
/// Returns [`DecodeError`] when any line holds more than one token; the whole
/// call fails rather than dropping the line.
pub fn decode_id_lines(raw: &str) -> Result<Vec<String>, DecodeError> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.contains(char::is_whitespace) {
                return Err(DecodeError::new(
                    "identifier list",
                    "line holds more than one token",
                    line,
                ));
            }
            Ok(String::from(line))
        })
        .collect()
}

/// Decode output that must contain exactly one identifier.
///
/// # Errors
///
/// Returns [`DecodeError`] when the output is blank, holds several lines, or
/// the identifier contains whitespace.
pub fn decode_single_id(raw: &str) -> Result<String, DecodeError> {
    let mut ids = decode_id_lines(raw)
        .map_err(|error| DecodeError::new("container id", error.reason, error.fragment))?
        .into_iter();

    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(DecodeError::new("container id", "output was empty", raw)),
        (Some(_), Some(_)) => Err(DecodeError::new(
            "container id",
            "expected exactly one identifier",
            raw,
        )),
    }
}

/// Decode one JSON record per line.
///
/// Blank output yields an empty vector. Every non-blank line is decoded on its
/// own.
///
/// # Errors
///
/// Returns [`DecodeError`] for the first line that is not a valid record; no
/// partial result is returned.
pub fn decode_json_lines<T: DeserializeOwned>(
    expected: &'static str,
    raw: &str,
) -> Result<Vec<T>, DecodeError> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<T>(line)
                .map_err(|error| DecodeError::new(expected, error.to_string(), line))
        })
        .collect()
}

/// Decode a single structured document.
///
/// `inspect` prints a JSON array; that array must hold exactly one object. A
/// bare object is accepted as well.
///
/// # Errors
///
/// Returns [`DecodeError`] when the output is not JSON, is empty, or does not
/// reduce to exactly one object.
pub fn decode_json_document(raw: &str) -> Result<InspectRecord, DecodeError> {
    let trimmed = raw.trim();
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|error| DecodeError::new("inspect document", error.to_string(), trimmed))?;

    let object = match value {
        Value::Array(items) => single_object(items, trimmed)?,
        Value::Object(map) => map,
        _ => {
            return Err(DecodeError::new(
                "inspect document",
                "expected a JSON object or a one-element array",
                trimmed,
            ));
        }
    };

    Ok(InspectRecord::new(object))
}

fn single_object(
    items: Vec<Value>,
    raw: &str,
) -> Result<serde_json::Map<String, Value>, DecodeError> {
    let mut iter = items.into_iter();
    match (iter.next(), iter.next()) {
        (Some(Value::Object(map)), None) => Ok(map),
        (None, _) => Err(DecodeError::new(
            "inspect document",
            "the runtime returned no documents",
            raw,
        )),
        (Some(_), Some(_)) => Err(DecodeError::new(
            "inspect document",
            "expected exactly one document",
            raw,
        )),
        (Some(_), None) => Err(DecodeError::new(
            "inspect document",
            "array element is not an object",
            raw,
        )),
    }
}

/// Return whether a verb's output echoes `target` on a line of its own.
///
/// Runtimes acknowledge `kill` and `rm` by printing the affected id.
#[must_use]
pub fn acknowledges(raw: &str, target: &str) -> bool {
    raw.lines().map(str::trim).any(|line| line == target)
}
