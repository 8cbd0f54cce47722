//! Derived-field calculator.
//!
//! Pure functions that turn source fields into computed fields. The same
//! functions run when the live cache materializes a snapshot, when a creation
//! form changes, and when an edit draft changes, so a displayed profit or night
//! count always matches the source fields currently entered.
//!
//! Inputs are accepted either as typed values (`f64`, `NaiveDate`) or as raw
//! form text, through the [`NumericInput`] and [`DateInput`] traits.

use chrono::{NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// A value that can be read as a monetary amount.
///
/// Missing or non-numeric input reads as zero.
pub trait NumericInput {
    /// Numeric value of the input, zero when absent or unparseable
    fn as_number(&self) -> f64;
}

impl NumericInput for f64 {
    fn as_number(&self) -> f64 {
        if self.is_finite() { *self } else { 0.0 }
    }
}

impl NumericInput for i64 {
    #[allow(clippy::cast_precision_loss)]
    fn as_number(&self) -> f64 {
        *self as f64
    }
}

impl NumericInput for str {
    fn as_number(&self) -> f64 {
        self.trim().parse::<f64>().map_or(0.0, |v| v.as_number())
    }
}

impl NumericInput for String {
    fn as_number(&self) -> f64 {
        self.as_str().as_number()
    }
}

impl<T: NumericInput + ?Sized> NumericInput for &T {
    fn as_number(&self) -> f64 {
        (**self).as_number()
    }
}

impl<T: NumericInput> NumericInput for Option<T> {
    fn as_number(&self) -> f64 {
        self.as_ref().map_or(0.0, NumericInput::as_number)
    }
}

/// How a date input was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateArg {
    /// Nothing was entered
    Absent,
    /// Text was entered but is not a date
    Invalid,
    /// A point in time; plain dates read as local midnight
    At(NaiveDateTime),
}

/// A value that can be read as a calendar date.
pub trait DateInput {
    /// Interprets the input
    fn as_date(&self) -> DateArg;
}

impl DateInput for NaiveDate {
    fn as_date(&self) -> DateArg {
        DateArg::At(self.and_time(chrono::NaiveTime::MIN))
    }
}

impl DateInput for NaiveDateTime {
    fn as_date(&self) -> DateArg {
        DateArg::At(*self)
    }
}

impl DateInput for str {
    fn as_date(&self) -> DateArg {
        let text = self.trim();
        if text.is_empty() {
            return DateArg::Absent;
        }
        parse_date_text(text).map_or(DateArg::Invalid, DateArg::At)
    }
}

impl DateInput for String {
    fn as_date(&self) -> DateArg {
        self.as_str().as_date()
    }
}

impl<T: DateInput + ?Sized> DateInput for &T {
    fn as_date(&self) -> DateArg {
        (**self).as_date()
    }
}

impl<T: DateInput> DateInput for Option<T> {
    fn as_date(&self) -> DateArg {
        self.as_ref().map_or(DateArg::Absent, DateInput::as_date)
    }
}

/// Parses ISO dates (`2024-05-01`) and date-times (`2024-05-01T14:30`,
/// `2024-05-01T14:30:00`, RFC 3339).
#[must_use]
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(at) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(at.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// `received - payable`, with missing or non-numeric operands read as zero.
#[must_use]
pub fn profit(received: impl NumericInput, payable: impl NumericInput) -> f64 {
    received.as_number() - payable.as_number()
}

/// Whole nights between check-in and check-out.
///
/// Returns `None` when either date is absent ("not computed"), `Some(0)` when
/// either is unparseable or check-out is not after check-in, and otherwise the
/// floored day difference.
#[must_use]
pub fn nights(check_in: impl DateInput, check_out: impl DateInput) -> Option<i64> {
    match (check_in.as_date(), check_out.as_date()) {
        (DateArg::Absent, _) | (_, DateArg::Absent) => None,
        (DateArg::At(start), DateArg::At(end)) => {
            let days = (end - start).num_seconds().div_euclid(SECONDS_PER_DAY);
            Some(days.max(0))
        }
        _ => Some(0),
    }
}

/// Renders a night count the way forms display it: empty when not computed.
#[must_use]
pub fn nights_text(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn test_profit_treats_blank_as_zero() {
        assert_eq!(profit(1000.0, ""), 1000.0);
        assert_eq!(profit("", ""), 0.0);
        assert_eq!(profit("1500", "400.5"), 1099.5);
    }

    #[test]
    fn test_profit_treats_garbage_and_missing_as_zero() {
        assert_eq!(profit("abc", 250.0), -250.0);
        assert_eq!(profit(None::<f64>, Some(10.0)), -10.0);
        assert_eq!(profit(f64::NAN, 5.0), -5.0);
    }

    #[test]
    fn test_nights_whole_day_difference() {
        assert_eq!(nights(date(2024, 5, 1), date(2024, 5, 4)), Some(3));
        assert_eq!(nights("2024-05-01", "2024-05-31"), Some(30));
    }

    #[test]
    fn test_nights_floors_partial_days() {
        assert_eq!(nights("2024-05-01T14:00", "2024-05-03T11:00"), Some(1));
    }

    #[test]
    fn test_nights_clamped_when_checkout_not_after_checkin() {
        assert_eq!(nights("2024-05-04", "2024-05-01"), Some(0));
        assert_eq!(nights("2024-05-04", "2024-05-04"), Some(0));
    }

    #[test]
    fn test_nights_unparseable_is_zero() {
        assert_eq!(nights("soon", "2024-05-04"), Some(0));
    }

    #[test]
    fn test_nights_absent_is_not_computed() {
        assert_eq!(nights("", "2024-05-04"), None);
        assert_eq!(nights(Some(date(2024, 5, 1)), None::<NaiveDate>), None);
        assert_eq!(nights_text(None), "");
        assert_eq!(nights_text(Some(0)), "0");
    }
}
