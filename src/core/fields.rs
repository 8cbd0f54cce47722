//! Parsing form text into typed fields and rendering fields back to text.

use crate::core::derive::parse_date_text;
use crate::errors::{Error, Result};
use chrono::NaiveDate;

fn invalid(field: &str, value: &str) -> Error {
    Error::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Optional text: blank input clears the field.
#[must_use]
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Optional amount: blank clears, anything else must be a finite number.
pub fn amount(field: &str, value: &str) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| invalid(field, value))
}

/// Optional count: blank clears, anything else must be a non-negative integer.
pub fn count(field: &str, value: &str) -> Result<Option<i32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .ok()
        .filter(|v| *v >= 0)
        .map(Some)
        .ok_or_else(|| invalid(field, value))
}

/// Optional calendar date: blank clears, date-times keep their date part.
pub fn date(field: &str, value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date_text(trimmed)
        .map(|at| Some(at.date()))
        .ok_or_else(|| invalid(field, value))
}

/// One of a fixed set of lowercase choices.
pub fn choice(field: &str, value: &str, allowed: &[&str]) -> Result<String> {
    let normalized = value.trim().to_ascii_lowercase();
    if allowed.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(invalid(field, value))
    }
}

/// Renders an amount without trailing zeros, empty when unset.
#[must_use]
pub fn amount_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Renders an ISO date, empty when unset.
#[must_use]
pub fn date_text(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Renders an optional value through `Display`, empty when unset.
#[must_use]
pub fn opt_text<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Splits a `field=value` assignment; the value may be blank or contain `=`.
pub fn assignment(text: &str) -> Result<(&str, &str)> {
    text.split_once('=')
        .map(|(field, value)| (field.trim(), value))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| invalid("assignment", text))
}
