//! Helpers for mapping flag values into request fields.
//!
//! Volume and interface flags are parallel sequences zipped by position:
//! one driving flag fixes the element count, and auxiliary flags supply
//! values per index, falling back to a documented default when the
//! sequence is shorter than the driving one. Absence is always the
//! default, never an error, so a trailing optional flag can simply be
//! left off.

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CliError;

/// Value of a parallel flag sequence at `index`, if supplied.
#[must_use]
pub fn at<T: Clone>(values: &[T], index: usize) -> Option<T> {
    values.get(index).cloned()
}

/// Value at `index`, or the given default when the sequence is shorter.
#[must_use]
pub fn at_or<T: Clone>(values: &[T], index: usize, default: T) -> T {
    values.get(index).cloned().unwrap_or(default)
}

/// String value at `index`, or empty when the sequence is shorter.
#[must_use]
pub fn string_at(values: &[String], index: usize) -> String {
    values.get(index).cloned().unwrap_or_default()
}

/// Parse repeated `KEY=VALUE` metadata entries into a map.
///
/// # Errors
///
/// Fails on any entry without a `=` or with an empty key.
pub fn parse_metadata(entries: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    let mut metadata = BTreeMap::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CliError::InvalidArgument(format!(
                "metadata entry '{entry}' is not KEY=VALUE"
            )));
        };
        if key.is_empty() {
            return Err(CliError::InvalidArgument(format!(
                "metadata entry '{entry}' has an empty key"
            )));
        }
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

/// Resolve the user data payload and base64-encode it for the wire.
///
/// A file always takes precedence over the inline value. Returns the
/// empty string when neither is supplied, which keeps the field off the
/// wire.
///
/// # Errors
///
/// Fails if the file cannot be read.
pub fn user_data(inline: Option<&str>, file: Option<&Path>) -> Result<String, CliError> {
    let payload = match file {
        Some(path) => std::fs::read(path)?,
        None => match inline {
            Some(text) => text.as_bytes().to_vec(),
            None => return Ok(String::new()),
        },
    };
    Ok(STANDARD.encode(payload))
}
