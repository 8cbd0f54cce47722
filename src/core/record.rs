//! Booking record schema.
//!
//! Each booking collection is a concrete SeaORM model implementing
//! [`BookingRecord`]. The trait carries everything the generic machinery
//! (store, live cache, filter pipeline, editor, exporter) needs to know about a
//! record type: identity and owner, its field table, its derived fields as a
//! list of [`Derivation`]s, and how it is read and written.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, prelude::DateTimeUtc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The booking collections the desk manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    /// Visa applications
    Visa,
    /// Umrah package bookings
    Umrah,
    /// Hotel bookings
    Hotel,
}

impl BookingKind {
    /// All collections, in menu order.
    pub const ALL: [Self; 3] = [Self::Visa, Self::Umrah, Self::Hotel];

    /// Name of the backing table.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Visa => "visa_bookings",
            Self::Umrah => "umrah_bookings",
            Self::Hotel => "hotel_bookings",
        }
    }

    /// Prefix used in exported report file names.
    #[must_use]
    pub const fn report_type(self) -> &'static str {
        match self {
            Self::Visa => "VisaReport",
            Self::Umrah => "UmrahReport",
            Self::Hotel => "HotelReport",
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visa => "visa",
            Self::Umrah => "umrah",
            Self::Hotel => "hotel",
        })
    }
}

impl FromStr for BookingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visa" | "visas" => Ok(Self::Visa),
            "umrah" => Ok(Self::Umrah),
            "hotel" | "hotels" => Ok(Self::Hotel),
            other => Err(Error::Config {
                message: format!("Unknown booking kind: {other}"),
            }),
        }
    }
}

/// One entry of a record's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Storage key
    pub key: &'static str,
    /// Display label, used in forms and reports
    pub label: &'static str,
    /// Other names the field is known by in forms
    pub aliases: &'static [&'static str],
}

impl FieldDef {
    /// Field known only by its storage key.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            aliases: &[],
        }
    }

    /// Field also reachable through display aliases.
    #[must_use]
    pub const fn aliased(
        key: &'static str,
        label: &'static str,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            aliases,
        }
    }

    fn answers_to(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// A derived field: which sources feed it and how it is recomputed.
pub struct Derivation<R> {
    /// Storage key of the derived field
    pub field: &'static str,
    /// Storage keys of the fields it is computed from
    pub sources: &'static [&'static str],
    /// Recomputes the derived field in place
    pub apply: fn(&mut R),
}

/// Money flowing through a booking, for aggregate summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Financials {
    /// Amount received from the client
    pub received: f64,
    /// Amount owed onward
    pub payable: f64,
    /// `received - payable`
    pub profit: f64,
}

/// Query contract: optional owner equality filter, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Only records created by this uid, when set
    pub owner: Option<String>,
}

impl RecordQuery {
    /// Every record in the collection.
    #[must_use]
    pub const fn everyone() -> Self {
        Self { owner: None }
    }

    /// Records owned by `uid`.
    #[must_use]
    pub fn owned_by(uid: impl Into<String>) -> Self {
        Self {
            owner: Some(uid.into()),
        }
    }
}

/// Behavior shared by every booking collection.
#[async_trait]
pub trait BookingRecord: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    /// Which collection this record lives in
    const KIND: BookingKind;
    /// Field table in report order
    const FIELDS: &'static [FieldDef];
    /// Fields that must be non-blank on create
    const REQUIRED_FIELDS: &'static [&'static str];
    /// Derived fields and how to compute them
    const DERIVATIONS: &'static [Derivation<Self>];

    /// Store-assigned identifier
    fn id(&self) -> i64;
    /// Uid of the staff member who created the record
    fn owner(&self) -> &str;
    /// Empty record owned by `owner`, as a creation form starts out
    fn blank(owner: &str) -> Self;
    /// When the record was created in the store
    fn created_at(&self) -> DateTimeUtc;
    /// Date used by date-window filters
    fn record_date(&self) -> Option<NaiveDate>;
    /// Value matched by the status filter
    fn status(&self) -> Option<&str>;
    /// Values matched by free-text search on pages with a fixed field list
    fn search_fields(&self) -> Vec<&str>;
    /// Natural key used to collapse duplicates, if the collection has one
    fn dedup_key(&self) -> Option<String> {
        None
    }
    /// Primary and secondary identifiers used in report file names
    fn report_identifiers(&self) -> (String, String);
    /// Received, payable and profit for aggregates
    fn financials(&self) -> Financials;

    /// Display text of a field by storage key, `None` for unknown keys
    fn field_text(&self, key: &str) -> Option<String>;
    /// Parses `value` into the field named by storage key
    fn assign(&mut self, key: &'static str, value: &str) -> Result<()>;

    /// Loads the records matching `query`, newest first
    async fn fetch_all(db: &DatabaseConnection, query: &RecordQuery) -> Result<Vec<Self>>;
    /// Loads one record by identifier
    async fn fetch_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>>;
    /// Inserts a new record and returns it with its identifier
    async fn insert_new(&self, db: &DatabaseConnection) -> Result<Self>;
    /// Writes the mutable field set back by identifier
    async fn write_mutable(&self, db: &DatabaseConnection) -> Result<Self>;

    /// Resolves a form field name or alias to its field definition.
    fn resolve_field(name: &str) -> Option<&'static FieldDef> {
        Self::FIELDS.iter().find(|f| f.answers_to(name))
    }

    /// Whether `key` is computed rather than entered.
    fn is_derived(key: &str) -> bool {
        Self::DERIVATIONS.iter().any(|d| d.field == key)
    }

    /// Derived fields that read from `key`.
    fn dependents(key: &str) -> Vec<&'static str> {
        Self::DERIVATIONS
            .iter()
            .filter(|d| d.sources.contains(&key))
            .map(|d| d.field)
            .collect()
    }

    /// Re-runs every derivation against the current source fields.
    fn recompute(&mut self) {
        for derivation in Self::DERIVATIONS {
            (derivation.apply)(self);
        }
    }

    /// Sets a field from form text and recomputes derived fields.
    ///
    /// Identity, owner and derived fields are rejected. Returns the derived
    /// fields that read from the changed field.
    fn set_field(&mut self, name: &str, value: &str) -> Result<Vec<&'static str>> {
        let def = Self::resolve_field(name).ok_or_else(|| Error::UnknownField {
            field: name.to_string(),
        })?;
        if Self::is_derived(def.key) {
            return Err(Error::ReadOnlyField {
                field: def.key.to_string(),
            });
        }
        self.assign(def.key, value)?;
        self.recompute();
        Ok(Self::dependents(def.key))
    }

    /// Checks that every required field has non-blank text.
    fn validate_required(&self) -> Result<()> {
        for &field in Self::REQUIRED_FIELDS {
            let present = self
                .field_text(field)
                .is_some_and(|text| !text.trim().is_empty());
            if !present {
                return Err(Error::MissingField { field });
            }
        }
        Ok(())
    }

    /// Label/value pairs in report order.
    fn labelled_fields(&self) -> Vec<(&'static str, String)> {
        Self::FIELDS
            .iter()
            .map(|f| (f.label, self.field_text(f.key).unwrap_or_default()))
            .collect()
    }
}

/// A booking of any kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum Booking {
    /// Visa application
    Visa(crate::entities::VisaBookingModel),
    /// Umrah package booking
    Umrah(crate::entities::UmrahBookingModel),
    /// Hotel booking
    Hotel(crate::entities::HotelBookingModel),
}

impl Booking {
    /// Loads a booking of `kind` by identifier.
    pub async fn fetch(db: &DatabaseConnection, kind: BookingKind, id: i64) -> Result<Self> {
        let found = match kind {
            BookingKind::Visa => {
                crate::entities::VisaBookingModel::fetch_by_id(db, id).await?.map(Self::Visa)
            }
            BookingKind::Umrah => {
                crate::entities::UmrahBookingModel::fetch_by_id(db, id).await?.map(Self::Umrah)
            }
            BookingKind::Hotel => {
                crate::entities::HotelBookingModel::fetch_by_id(db, id).await?.map(Self::Hotel)
            }
        };
        found
            .map(|mut booking| {
                booking.recompute();
                booking
            })
            .ok_or(Error::RecordNotFound { kind, id })
    }

    /// Collection the booking belongs to.
    #[must_use]
    pub const fn kind(&self) -> BookingKind {
        match self {
            Self::Visa(_) => BookingKind::Visa,
            Self::Umrah(_) => BookingKind::Umrah,
            Self::Hotel(_) => BookingKind::Hotel,
        }
    }

    /// Re-runs the derivations of whichever variant this is.
    pub fn recompute(&mut self) {
        match self {
            Self::Visa(r) => r.recompute(),
            Self::Umrah(r) => r.recompute(),
            Self::Hotel(r) => r.recompute(),
        }
    }

    /// Label/value pairs in report order.
    #[must_use]
    pub fn labelled_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Visa(r) => r.labelled_fields(),
            Self::Umrah(r) => r.labelled_fields(),
            Self::Hotel(r) => r.labelled_fields(),
        }
    }

    /// Primary and secondary identifiers for report file names.
    #[must_use]
    pub fn report_identifiers(&self) -> (String, String) {
        match self {
            Self::Visa(r) => r.report_identifiers(),
            Self::Umrah(r) => r.report_identifiers(),
            Self::Hotel(r) => r.report_identifiers(),
        }
    }

    /// Financial triple of the booking.
    #[must_use]
    pub fn financials(&self) -> Financials {
        match self {
            Self::Visa(r) => r.financials(),
            Self::Umrah(r) => r.financials(),
            Self::Hotel(r) => r.financials(),
        }
    }
}
