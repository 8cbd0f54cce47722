//! View filter pipeline.
//!
//! A pure function of the cached list, a status filter, a relative date window
//! and a search term. Windows are anchored at "today" in local time and passed
//! in explicitly, so the same inputs always produce the same list.

use crate::{
    core::record::BookingRecord,
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Relative date window a list can be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateWindow {
    /// No date restriction
    #[default]
    AllTime,
    /// Today's local date only
    Today,
    /// Yesterday's local date only
    Yesterday,
    /// Today and the six days before it
    Last7Days,
    /// Today and the twenty-nine days before it
    Last30Days,
    /// Monday of the current week through today
    ThisWeek,
    /// First of the current month through today
    ThisMonth,
    /// January 1st through today
    ThisYear,
}

impl DateWindow {
    /// Every window, in menu order.
    pub const ALL: [Self; 8] = [
        Self::AllTime,
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last30Days,
        Self::ThisWeek,
        Self::ThisMonth,
        Self::ThisYear,
    ];

    /// Window start and, for single-day windows, the last day included.
    ///
    /// `None` for all time. Open-ended windows keep records dated after today.
    #[must_use]
    pub fn bounds(self, today: NaiveDate) -> Option<(NaiveDate, Option<NaiveDate>)> {
        let back = |days: u64| today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        match self {
            Self::AllTime => None,
            Self::Today => Some((today, Some(today))),
            Self::Yesterday => {
                let yesterday = back(1);
                Some((yesterday, Some(yesterday)))
            }
            Self::Last7Days => Some((back(6), None)),
            Self::Last30Days => Some((back(29), None)),
            Self::ThisWeek => Some((back(u64::from(today.weekday().num_days_from_monday())), None)),
            Self::ThisMonth => Some((today.with_day(1).unwrap_or(today), None)),
            Self::ThisYear => Some((today.with_ordinal(1).unwrap_or(today), None)),
        }
    }

    /// Whether a record dated `date` falls in the window.
    ///
    /// Undated records only pass the all-time window.
    #[must_use]
    pub fn contains(self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        match (self.bounds(today), date) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some((start, end)), Some(d)) => start <= d && end.is_none_or(|end| d <= end),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::AllTime => "all-time",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last-7-days",
            Self::Last30Days => "last-30-days",
            Self::ThisWeek => "this-week",
            Self::ThisMonth => "this-month",
            Self::ThisYear => "this-year",
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DateWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Self::ALL
            .into_iter()
            .find(|w| w.name() == wanted)
            .ok_or(Error::UnsupportedWindow {
                window: s.to_string(),
            })
    }
}

/// Status filter; the default shows every record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// No status restriction
    #[default]
    All,
    /// Records whose status equals this value, ignoring case
    Only(String),
}

impl StatusFilter {
    /// Builds a filter from a menu value; blank or "all" shows everything.
    #[must_use]
    pub fn from_choice(choice: &str) -> Self {
        let trimmed = choice.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    fn matches(&self, status: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status.is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted)),
        }
    }
}

/// Which values free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// The record type's fixed search fields
    #[default]
    FixedFields,
    /// Every string-valued field of the record
    AllStringFields,
}

/// The three filter inputs of a list page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewFilter {
    /// Status restriction
    pub status: StatusFilter,
    /// Date window restriction
    pub window: DateWindow,
    /// Free-text search term; blank matches everything
    pub search: String,
    /// Fields the search term is matched against
    pub scope: SearchScope,
}

impl ViewFilter {
    /// Whether `record` passes every filter.
    pub fn matches<R: BookingRecord>(&self, record: &R, today: NaiveDate) -> bool {
        self.status.matches(record.status())
            && self.window.contains(record.record_date(), today)
            && matches_search(record, &self.search, self.scope)
    }

    /// Filtered copy of `records`, order preserved.
    pub fn apply<R: BookingRecord>(&self, records: &[R], today: NaiveDate) -> Vec<R> {
        records
            .iter()
            .filter(|r| self.matches(*r, today))
            .cloned()
            .collect()
    }
}

/// Case-insensitive substring search; a blank term matches everything.
pub fn matches_search<R: BookingRecord>(record: &R, term: &str, scope: SearchScope) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    match scope {
        SearchScope::FixedFields => record
            .search_fields()
            .iter()
            .any(|value| value.to_lowercase().contains(&needle)),
        SearchScope::AllStringFields => string_values(record)
            .iter()
            .any(|value| value.to_lowercase().contains(&needle)),
    }
}

fn string_values<R: BookingRecord>(record: &R) -> Vec<String> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(_, value)| match value {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
