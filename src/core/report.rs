//! Report export.
//!
//! Builds the per-booking report: a fixed letterhead, then the record's fields
//! in table order laid out two label/value pairs per row. List reports add a
//! summary block with totals over the filtered set. File names are
//! deterministic: `<ReportType>_<primary>_<secondary>_<YYYY-MM-DD>`.

use crate::{
    config::app::{AgencyConfig, ReportConfig},
    core::record::{Booking, BookingKind, BookingRecord, Financials},
    errors::Result,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Static header printed at the top of every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Letterhead {
    /// Agency name
    pub name: String,
    /// Contact lines under the name
    pub lines: Vec<String>,
}

impl From<&AgencyConfig> for Letterhead {
    fn from(agency: &AgencyConfig) -> Self {
        let lines = [&agency.address, &agency.phone, &agency.email]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        Self {
            name: agency.name.clone(),
            lines,
        }
    }
}

/// One table row: `field, value, field, value`.
pub type ReportRow = [String; 4];

/// Totals across a filtered set of bookings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Number of bookings summed
    pub count: usize,
    /// Sum of amounts received
    pub received: f64,
    /// Sum of amounts payable
    pub payable: f64,
    /// Sum of profit
    pub profit: f64,
    /// Currency prefix used when formatting
    pub currency_prefix: String,
}

impl ReportSummary {
    /// Sums the financials of `records`.
    pub fn from_records<R: BookingRecord>(records: &[R], currency_prefix: &str) -> Self {
        Self::from_financials(records.iter().map(BookingRecord::financials), currency_prefix)
    }

    /// Sums a sequence of financial triples.
    pub fn from_financials(items: impl IntoIterator<Item = Financials>, currency_prefix: &str) -> Self {
        let mut summary = Self {
            count: 0,
            received: 0.0,
            payable: 0.0,
            profit: 0.0,
            currency_prefix: currency_prefix.to_string(),
        };
        for item in items {
            summary.count += 1;
            summary.received += item.received;
            summary.payable += item.payable;
            summary.profit += item.profit;
        }
        summary
    }

    /// Summary lines as printed under the letterhead.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let prefix = &self.currency_prefix;
        vec![
            format!("Bookings: {}", self.count),
            format!("Total Received: {}", format_currency(prefix, self.received)),
            format!("Total Payable: {}", format_currency(prefix, self.payable)),
            format!("Total Profit: {}", format_currency(prefix, self.profit)),
        ]
    }
}

/// A laid-out report ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    /// Header block
    pub letterhead: Letterhead,
    /// Report title under the header
    pub title: String,
    /// Totals, for list reports
    pub summary: Option<ReportSummary>,
    /// Column headings of the table
    pub columns: ReportRow,
    /// Table body
    pub rows: Vec<ReportRow>,
    /// Deterministic file stem
    pub file_stem: String,
}

fn field_columns() -> ReportRow {
    [
        "Field".to_string(),
        "Value".to_string(),
        "Field".to_string(),
        "Value".to_string(),
    ]
}

/// Lays label/value pairs out two per row, padding the last row.
#[must_use]
pub fn pair_rows(pairs: &[(&'static str, String)]) -> Vec<ReportRow> {
    pairs
        .chunks(2)
        .map(|chunk| {
            let (l1, v1) = &chunk[0];
            let (l2, v2) = chunk
                .get(1)
                .map_or((String::new(), String::new()), |(l, v)| ((*l).to_string(), v.clone()));
            [(*l1).to_string(), v1.clone(), l2, v2]
        })
        .collect()
}

/// Strips characters that cannot appear in a file name.
fn file_part(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_whitespace() => '-',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// `<ReportType>_<primary>_<secondary>_<YYYY-MM-DD>`.
#[must_use]
pub fn report_file_stem(kind: BookingKind, primary: &str, secondary: &str, today: NaiveDate) -> String {
    format!(
        "{}_{}_{}_{}",
        kind.report_type(),
        file_part(primary),
        file_part(secondary),
        today.format("%Y-%m-%d")
    )
}

/// Report for a single booking.
#[must_use]
pub fn build_booking_report(booking: &Booking, letterhead: &Letterhead, today: NaiveDate) -> ReportDocument {
    let kind = booking.kind();
    let (primary, secondary) = booking.report_identifiers();
    ReportDocument {
        letterhead: letterhead.clone(),
        title: format!("{} Booking Report", capitalize(&kind.to_string())),
        summary: None,
        columns: field_columns(),
        rows: pair_rows(&booking.labelled_fields()),
        file_stem: report_file_stem(kind, &primary, &secondary, today),
    }
}

/// Report listing `records` with totals.
///
/// `scope` names the filtered set (for example a date window) and becomes the
/// secondary identifier of the file name.
pub fn build_list_report<R: BookingRecord>(
    records: &[R],
    scope: &str,
    letterhead: &Letterhead,
    config: &ReportConfig,
    today: NaiveDate,
) -> ReportDocument {
    let summary = ReportSummary::from_records(records, &config.currency_prefix);
    let prefix = &config.currency_prefix;
    let rows = records
        .iter()
        .map(|record| {
            let (primary, secondary) = record.report_identifiers();
            let money = record.financials();
            [
                primary,
                secondary,
                format_currency(prefix, money.received),
                format_currency(prefix, money.profit),
            ]
        })
        .collect();
    ReportDocument {
        letterhead: letterhead.clone(),
        title: format!("{} Bookings ({scope})", capitalize(&R::KIND.to_string())),
        summary: Some(summary),
        columns: [
            "Reference".to_string(),
            "Name".to_string(),
            "Received".to_string(),
            "Profit".to_string(),
        ],
        rows,
        file_stem: report_file_stem(R::KIND, "List", scope, today),
    }
}

impl ReportDocument {
    /// Plain-text rendering with aligned columns.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Writes the text rendering to `<dir>/<file_stem>.txt`.
    pub fn write_text(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.txt", self.file_stem));
        std::fs::write(&path, self.render_text())?;
        info!(path = %path.display(), "Report written");
        Ok(path)
    }

    /// Writes the document as JSON to `<dir>/<file_stem>.json`.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.file_stem));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Report written");
        Ok(path)
    }
}

impl fmt::Display for ReportDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.letterhead.name)?;
        for line in &self.letterhead.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{}", "=".repeat(self.letterhead.name.chars().count().max(40)))?;
        writeln!(f, "{}", self.title)?;
        if let Some(summary) = &self.summary {
            writeln!(f)?;
            for line in summary.lines() {
                writeln!(f, "{line}")?;
            }
        }
        writeln!(f)?;

        let mut widths = [0_usize; 4];
        for row in std::iter::once(&self.columns).chain(&self.rows) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let render_row = |row: &ReportRow| {
            row.iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };
        writeln!(f, "{}", render_row(&self.columns))?;
        writeln!(f, "{}", widths.map(|w| "-".repeat(w)).join("-+-"))?;
        for row in &self.rows {
            writeln!(f, "{}", render_row(row))?;
        }
        Ok(())
    }
}

/// Formats `amount` with grouped thousands and two decimals: `PKR 1,234,567.00`.
#[must_use]
pub fn format_currency(prefix: &str, amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }
    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };
    if prefix.is_empty() {
        format!("{sign}{grouped}.{cents}")
    } else {
        format!("{prefix} {sign}{grouped}.{cents}")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
