//! Visa booking business logic.
//!
//! Visa bookings are private to the staff member who created them, collapse
//! duplicates by passport and destination country, and compute profit as
//! `total_fee - received_fee`. Vendor contact and vendor fee only apply when
//! the application is processed through a vendor.

use crate::{
    core::{
        derive::profit,
        fields,
        record::{BookingKind, BookingRecord, Derivation, FieldDef, Financials, RecordQuery},
    },
    entities::{VisaBooking, visa_booking},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue::Unchanged, QueryOrder, Set, prelude::*};

/// Application processed in-house.
pub const SOURCE_DIRECT: &str = "direct";
/// Application processed through an outside vendor.
pub const SOURCE_VENDOR: &str = "vendor";

const SOURCES: &[&str] = &[SOURCE_DIRECT, SOURCE_VENDOR];

fn derive_profit(record: &mut visa_booking::Model) {
    record.profit = profit(record.total_fee, record.received_fee);
}

impl visa_booking::Model {
    /// Whether vendor fields apply to this application.
    #[must_use]
    pub fn uses_vendor(&self) -> bool {
        self.source == SOURCE_VENDOR
    }
}

#[async_trait]
impl BookingRecord for visa_booking::Model {
    const KIND: BookingKind = BookingKind::Visa;
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("passport", "Passport No."),
        FieldDef::aliased("full_name", "Full Name", &["name", "fullName"]),
        FieldDef::aliased("visa_type", "Visa Type", &["visaType"]),
        FieldDef::new("country", "Country"),
        FieldDef::new("date", "Date"),
        FieldDef::aliased("total_fee", "Total Fee", &["totalFee"]),
        FieldDef::aliased("received_fee", "Received Fee", &["receivedFee"]),
        FieldDef::aliased("remaining_fee", "Remaining Fee", &["remainingFee"]),
        FieldDef::new("profit", "Profit"),
        FieldDef::aliased("payment_status", "Payment Status", &["paymentStatus"]),
        FieldDef::aliased("visa_status", "Visa Status", &["visaStatus"]),
        FieldDef::aliased("embassy_fee", "Embassy Fee", &["embassyFee"]),
        FieldDef::aliased("sent_to_embassy", "Sent To Embassy", &["sentToEmbassy"]),
        FieldDef::aliased(
            "receive_from_embassy",
            "Received From Embassy",
            &["receiveFromEmbassy"],
        ),
        FieldDef::new("email", "Email"),
        FieldDef::new("source", "Source"),
        FieldDef::aliased("vendor_contact", "Vendor Contact", &["vendorContact"]),
        FieldDef::aliased("vendor_fee", "Vendor Fee", &["vendorFee"]),
    ];
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "passport",
        "full_name",
        "visa_type",
        "country",
        "date",
        "total_fee",
        "payment_status",
        "visa_status",
    ];
    const DERIVATIONS: &'static [Derivation<Self>] = &[Derivation {
        field: "profit",
        sources: &["total_fee", "received_fee"],
        apply: derive_profit,
    }];

    fn id(&self) -> i64 {
        self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn blank(owner: &str) -> Self {
        Self {
            id: 0,
            passport: String::new(),
            full_name: String::new(),
            visa_type: String::new(),
            country: String::new(),
            date: None,
            total_fee: None,
            received_fee: None,
            remaining_fee: None,
            profit: 0.0,
            payment_status: String::new(),
            visa_status: String::new(),
            embassy_fee: None,
            sent_to_embassy: None,
            receive_from_embassy: None,
            email: None,
            source: SOURCE_DIRECT.to_string(),
            vendor_contact: None,
            vendor_fee: None,
            user_id: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    fn created_at(&self) -> DateTimeUtc {
        self.created_at
    }

    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn status(&self) -> Option<&str> {
        Some(self.visa_status.as_str()).filter(|s| !s.is_empty())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.full_name.as_str(),
            self.passport.as_str(),
            self.country.as_str(),
        ]
    }

    fn dedup_key(&self) -> Option<String> {
        let passport = self.passport.trim().to_lowercase();
        let country = self.country.trim().to_lowercase();
        Some(format!("{passport}|{country}"))
    }

    fn report_identifiers(&self) -> (String, String) {
        (self.passport.clone(), self.full_name.clone())
    }

    fn financials(&self) -> Financials {
        // Quoted fee is what the desk earns against; received fee is netted off.
        Financials {
            received: self.total_fee.unwrap_or_default(),
            payable: self.received_fee.unwrap_or_default(),
            profit: self.profit,
        }
    }

    fn field_text(&self, key: &str) -> Option<String> {
        let text = match key {
            "passport" => self.passport.clone(),
            "full_name" => self.full_name.clone(),
            "visa_type" => self.visa_type.clone(),
            "country" => self.country.clone(),
            "date" => fields::date_text(self.date),
            "total_fee" => fields::amount_text(self.total_fee),
            "received_fee" => fields::amount_text(self.received_fee),
            "remaining_fee" => fields::amount_text(self.remaining_fee),
            "profit" => self.profit.to_string(),
            "payment_status" => self.payment_status.clone(),
            "visa_status" => self.visa_status.clone(),
            "embassy_fee" => fields::amount_text(self.embassy_fee),
            "sent_to_embassy" => fields::date_text(self.sent_to_embassy),
            "receive_from_embassy" => fields::date_text(self.receive_from_embassy),
            "email" => fields::opt_text(self.email.as_ref()),
            "source" => self.source.clone(),
            "vendor_contact" => fields::opt_text(self.vendor_contact.as_ref()),
            "vendor_fee" => fields::amount_text(self.vendor_fee),
            _ => return None,
        };
        Some(text)
    }

    fn assign(&mut self, key: &'static str, value: &str) -> Result<()> {
        match key {
            "passport" => self.passport = value.to_string(),
            "full_name" => self.full_name = value.to_string(),
            "visa_type" => self.visa_type = value.to_string(),
            "country" => self.country = value.to_string(),
            "date" => self.date = fields::date(key, value)?,
            "total_fee" => self.total_fee = fields::amount(key, value)?,
            "received_fee" => self.received_fee = fields::amount(key, value)?,
            "remaining_fee" => self.remaining_fee = fields::amount(key, value)?,
            "payment_status" => self.payment_status = value.to_string(),
            "visa_status" => self.visa_status = value.to_string(),
            "embassy_fee" => self.embassy_fee = fields::amount(key, value)?,
            "sent_to_embassy" => self.sent_to_embassy = fields::date(key, value)?,
            "receive_from_embassy" => self.receive_from_embassy = fields::date(key, value)?,
            "email" => self.email = fields::optional_text(value),
            "source" => self.source = fields::choice(key, value, SOURCES)?,
            "vendor_contact" => self.vendor_contact = fields::optional_text(value),
            "vendor_fee" => self.vendor_fee = fields::amount(key, value)?,
            _ => {
                return Err(Error::ReadOnlyField {
                    field: key.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn fetch_all(db: &DatabaseConnection, query: &RecordQuery) -> Result<Vec<Self>> {
        let mut select = VisaBooking::find();
        if let Some(owner) = &query.owner {
            select = select.filter(visa_booking::Column::UserId.eq(owner.as_str()));
        }
        select
            .order_by_desc(visa_booking::Column::CreatedAt)
            .order_by_desc(visa_booking::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn fetch_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>> {
        VisaBooking::find_by_id(id).one(db).await.map_err(Into::into)
    }

    async fn insert_new(&self, db: &DatabaseConnection) -> Result<Self> {
        let uses_vendor = self.uses_vendor();
        let booking = visa_booking::ActiveModel {
            passport: Set(self.passport.trim().to_string()),
            full_name: Set(self.full_name.trim().to_string()),
            visa_type: Set(self.visa_type.trim().to_string()),
            country: Set(self.country.trim().to_string()),
            date: Set(self.date),
            total_fee: Set(self.total_fee),
            received_fee: Set(self.received_fee),
            remaining_fee: Set(self.remaining_fee),
            profit: Set(profit(self.total_fee, self.received_fee)),
            payment_status: Set(self.payment_status.trim().to_string()),
            visa_status: Set(self.visa_status.trim().to_string()),
            embassy_fee: Set(self.embassy_fee),
            sent_to_embassy: Set(self.sent_to_embassy),
            receive_from_embassy: Set(self.receive_from_embassy),
            email: Set(self.email.clone()),
            source: Set(self.source.clone()),
            vendor_contact: Set(self.vendor_contact.clone().filter(|_| uses_vendor)),
            vendor_fee: Set(self.vendor_fee.filter(|_| uses_vendor)),
            user_id: Set(self.user_id.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        booking.insert(db).await.map_err(Into::into)
    }

    async fn write_mutable(&self, db: &DatabaseConnection) -> Result<Self> {
        let mut booking = visa_booking::ActiveModel {
            id: Unchanged(self.id),
            passport: Set(self.passport.trim().to_string()),
            full_name: Set(self.full_name.trim().to_string()),
            visa_type: Set(self.visa_type.trim().to_string()),
            country: Set(self.country.trim().to_string()),
            date: Set(self.date),
            total_fee: Set(self.total_fee),
            received_fee: Set(self.received_fee),
            remaining_fee: Set(self.remaining_fee),
            profit: Set(profit(self.total_fee, self.received_fee)),
            payment_status: Set(self.payment_status.trim().to_string()),
            visa_status: Set(self.visa_status.trim().to_string()),
            embassy_fee: Set(self.embassy_fee),
            sent_to_embassy: Set(self.sent_to_embassy),
            receive_from_embassy: Set(self.receive_from_embassy),
            email: Set(self.email.clone()),
            source: Set(self.source.clone()),
            ..Default::default()
        };
        // Vendor fields are left untouched unless the application goes through a vendor.
        if self.uses_vendor() {
            booking.vendor_contact = Set(self.vendor_contact.clone());
            booking.vendor_fee = Set(self.vendor_fee);
        }
        booking.update(db).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_set_field_recomputes_profit() {
        let mut visa = visa_booking::Model::blank("staff-1");
        visa.set_field("totalFee", "1000").unwrap();
        assert_eq!(visa.profit, 1000.0);
        let touched = visa.set_field("received_fee", "400").unwrap();
        assert_eq!(touched, vec!["profit"]);
        assert_eq!(visa.profit, 600.0);
        visa.set_field("received_fee", "").unwrap();
        assert_eq!(visa.profit, 1000.0);
    }

    #[test]
    fn test_remaining_fee_is_not_derived() {
        let mut visa = visa_booking::Model::blank("staff-1");
        visa.set_field("total_fee", "1000").unwrap();
        visa.set_field("received_fee", "400").unwrap();
        assert_eq!(visa.remaining_fee, None);
        visa.set_field("remaining_fee", "550").unwrap();
        assert_eq!(visa.remaining_fee, Some(550.0));
        assert_eq!(visa.profit, 600.0);
    }

    #[test]
    fn test_identity_owner_and_profit_are_not_editable() {
        let mut visa = visa_booking::Model::blank("staff-1");
        assert!(matches!(
            visa.set_field("profit", "5"),
            Err(Error::ReadOnlyField { .. })
        ));
        assert!(matches!(
            visa.set_field("user_id", "staff-2"),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            visa.set_field("id", "9"),
            Err(Error::UnknownField { .. })
        ));
        assert_eq!(visa.user_id, "staff-1");
    }

    #[test]
    fn test_dedup_key_ignores_case_and_whitespace() {
        let mut a = visa_booking::Model::blank("staff-1");
        a.passport = "AB123".to_string();
        a.country = "Saudi Arabia".to_string();
        let mut b = a.clone();
        b.passport = " ab123 ".to_string();
        b.country = "saudi arabia".to_string();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_validate_required_reports_first_blank_field() {
        let mut visa = visa_booking::Model::blank("staff-1");
        visa.set_field("passport", "AB123").unwrap();
        visa.set_field("full_name", "   ").unwrap();
        assert!(matches!(
            visa.validate_required(),
            Err(Error::MissingField { field: "full_name" })
        ));
    }

    #[tokio::test]
    async fn test_insert_drops_vendor_fields_for_direct_applications() -> Result<()> {
        let store = setup_test_store().await?;
        let mut draft = sample_visa("staff-1", "AB123", "Turkey", "2024-05-01");
        draft.set_field("vendor_contact", "Ali Travels")?;
        draft.set_field("vendor_fee", "50")?;
        let saved = store.insert(&draft).await?;
        assert_eq!(saved.vendor_contact, None);
        assert_eq!(saved.vendor_fee, None);
        assert_eq!(saved.profit, 600.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_mutable_only_touches_vendor_fields_for_vendor_source() -> Result<()> {
        let store = setup_test_store().await?;
        let mut draft = sample_visa("staff-1", "AB123", "Turkey", "2024-05-01");
        draft.set_field("source", "vendor")?;
        draft.set_field("vendor_contact", "Ali Travels")?;
        draft.set_field("vendor_fee", "50")?;
        let mut saved = store.insert(&draft).await?;
        assert_eq!(saved.vendor_fee, Some(50.0));

        saved.set_field("source", "direct")?;
        saved.set_field("vendor_fee", "75")?;
        let updated = store.update(&saved).await?;
        assert_eq!(updated.source, SOURCE_DIRECT);
        assert_eq!(updated.vendor_fee, Some(50.0));
        assert_eq!(updated.vendor_contact.as_deref(), Some("Ali Travels"));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_all_filters_by_owner_newest_first() -> Result<()> {
        let store = setup_test_store().await?;
        let first = store
            .insert(&sample_visa("staff-1", "AB1", "Turkey", "2024-05-01"))
            .await?;
        store
            .insert(&sample_visa("staff-2", "AB2", "Turkey", "2024-05-02"))
            .await?;
        let third = store
            .insert(&sample_visa("staff-1", "AB3", "Oman", "2024-05-03"))
            .await?;

        let mine =
            visa_booking::Model::fetch_all(store.connection(), &RecordQuery::owned_by("staff-1"))
                .await?;
        let ids: Vec<i64> = mine.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_by_id_not_found() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<visa_booking::Model>::new()])
            .into_connection();
        let found = visa_booking::Model::fetch_by_id(&db, 42).await?;
        assert!(found.is_none());
        Ok(())
    }
}
