//! Umrah booking business logic.
//!
//! An Umrah booking carries two hotel stays; each stay's night count is derived
//! from its own check-in/check-out pair.

use crate::{
    core::{
        derive::{nights, nights_text, profit},
        fields,
        record::{BookingKind, BookingRecord, Derivation, FieldDef, Financials, RecordQuery},
    },
    entities::{UmrahBooking, umrah_booking},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue::Unchanged, QueryOrder, Set, prelude::*};

fn derive_makkah_nights(record: &mut umrah_booking::Model) {
    record.makkah_nights = nights(record.makkah_check_in, record.makkah_check_out);
}

fn derive_madinah_nights(record: &mut umrah_booking::Model) {
    record.madinah_nights = nights(record.madinah_check_in, record.madinah_check_out);
}

fn derive_profit(record: &mut umrah_booking::Model) {
    record.profit = profit(record.received, record.payable);
}

#[async_trait]
impl BookingRecord for umrah_booking::Model {
    const KIND: BookingKind = BookingKind::Umrah;
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::aliased("passenger_name", "Passenger Name", &["name", "passengerName"]),
        FieldDef::aliased("passport_number", "Passport No.", &["passport", "passportNumber"]),
        FieldDef::aliased("package_name", "Package", &["package", "packageName"]),
        FieldDef::aliased("booking_date", "Booking Date", &["date", "bookingDate"]),
        FieldDef::new("passengers", "Passengers"),
        FieldDef::aliased("makkah_hotel", "Makkah Hotel", &["makkahHotel"]),
        FieldDef::aliased("makkah_check_in", "Makkah Check-in", &["makkahCheckIn"]),
        FieldDef::aliased("makkah_check_out", "Makkah Check-out", &["makkahCheckOut"]),
        FieldDef::aliased("makkah_nights", "Makkah Nights", &["makkahNights"]),
        FieldDef::aliased("madinah_hotel", "Madinah Hotel", &["madinahHotel"]),
        FieldDef::aliased("madinah_check_in", "Madinah Check-in", &["madinahCheckIn"]),
        FieldDef::aliased("madinah_check_out", "Madinah Check-out", &["madinahCheckOut"]),
        FieldDef::aliased("madinah_nights", "Madinah Nights", &["madinahNights"]),
        FieldDef::new("received", "Received"),
        FieldDef::new("payable", "Payable"),
        FieldDef::new("profit", "Profit"),
        FieldDef::aliased("payment_status", "Payment Status", &["status", "paymentStatus"]),
    ];
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "passenger_name",
        "passport_number",
        "package_name",
        "booking_date",
        "received",
        "payable",
        "payment_status",
    ];
    const DERIVATIONS: &'static [Derivation<Self>] = &[
        Derivation {
            field: "makkah_nights",
            sources: &["makkah_check_in", "makkah_check_out"],
            apply: derive_makkah_nights,
        },
        Derivation {
            field: "madinah_nights",
            sources: &["madinah_check_in", "madinah_check_out"],
            apply: derive_madinah_nights,
        },
        Derivation {
            field: "profit",
            sources: &["received", "payable"],
            apply: derive_profit,
        },
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn owner(&self) -> &str {
        &self.created_by_uid
    }

    fn blank(owner: &str) -> Self {
        Self {
            id: 0,
            passenger_name: String::new(),
            passport_number: String::new(),
            package_name: String::new(),
            booking_date: None,
            passengers: None,
            makkah_hotel: None,
            makkah_check_in: None,
            makkah_check_out: None,
            makkah_nights: None,
            madinah_hotel: None,
            madinah_check_in: None,
            madinah_check_out: None,
            madinah_nights: None,
            received: None,
            payable: None,
            profit: 0.0,
            payment_status: String::new(),
            created_by_uid: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    fn created_at(&self) -> DateTimeUtc {
        self.created_at
    }

    fn record_date(&self) -> Option<NaiveDate> {
        self.booking_date
    }

    fn status(&self) -> Option<&str> {
        Some(self.payment_status.as_str()).filter(|s| !s.is_empty())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.passenger_name.as_str(),
            self.passport_number.as_str(),
            self.package_name.as_str(),
        ]
    }

    fn report_identifiers(&self) -> (String, String) {
        (self.passport_number.clone(), self.passenger_name.clone())
    }

    fn financials(&self) -> Financials {
        Financials {
            received: self.received.unwrap_or_default(),
            payable: self.payable.unwrap_or_default(),
            profit: self.profit,
        }
    }

    fn field_text(&self, key: &str) -> Option<String> {
        let text = match key {
            "passenger_name" => self.passenger_name.clone(),
            "passport_number" => self.passport_number.clone(),
            "package_name" => self.package_name.clone(),
            "booking_date" => fields::date_text(self.booking_date),
            "passengers" => fields::opt_text(self.passengers.as_ref()),
            "makkah_hotel" => fields::opt_text(self.makkah_hotel.as_ref()),
            "makkah_check_in" => fields::date_text(self.makkah_check_in),
            "makkah_check_out" => fields::date_text(self.makkah_check_out),
            "makkah_nights" => nights_text(self.makkah_nights),
            "madinah_hotel" => fields::opt_text(self.madinah_hotel.as_ref()),
            "madinah_check_in" => fields::date_text(self.madinah_check_in),
            "madinah_check_out" => fields::date_text(self.madinah_check_out),
            "madinah_nights" => nights_text(self.madinah_nights),
            "received" => fields::amount_text(self.received),
            "payable" => fields::amount_text(self.payable),
            "profit" => self.profit.to_string(),
            "payment_status" => self.payment_status.clone(),
            _ => return None,
        };
        Some(text)
    }

    fn assign(&mut self, key: &'static str, value: &str) -> Result<()> {
        match key {
            "passenger_name" => self.passenger_name = value.to_string(),
            "passport_number" => self.passport_number = value.to_string(),
            "package_name" => self.package_name = value.to_string(),
            "booking_date" => self.booking_date = fields::date(key, value)?,
            "passengers" => self.passengers = fields::count(key, value)?,
            "makkah_hotel" => self.makkah_hotel = fields::optional_text(value),
            "makkah_check_in" => self.makkah_check_in = fields::date(key, value)?,
            "makkah_check_out" => self.makkah_check_out = fields::date(key, value)?,
            "madinah_hotel" => self.madinah_hotel = fields::optional_text(value),
            "madinah_check_in" => self.madinah_check_in = fields::date(key, value)?,
            "madinah_check_out" => self.madinah_check_out = fields::date(key, value)?,
            "received" => self.received = fields::amount(key, value)?,
            "payable" => self.payable = fields::amount(key, value)?,
            "payment_status" => self.payment_status = value.to_string(),
            _ => {
                return Err(Error::ReadOnlyField {
                    field: key.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn fetch_all(db: &DatabaseConnection, query: &RecordQuery) -> Result<Vec<Self>> {
        let mut select = UmrahBooking::find();
        if let Some(owner) = &query.owner {
            select = select.filter(umrah_booking::Column::CreatedByUid.eq(owner.as_str()));
        }
        select
            .order_by_desc(umrah_booking::Column::CreatedAt)
            .order_by_desc(umrah_booking::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn fetch_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>> {
        UmrahBooking::find_by_id(id).one(db).await.map_err(Into::into)
    }

    async fn insert_new(&self, db: &DatabaseConnection) -> Result<Self> {
        let booking = umrah_booking::ActiveModel {
            created_by_uid: Set(self.created_by_uid.clone()),
            created_at: Set(Utc::now()),
            ..mutable_fields(self)
        };
        booking.insert(db).await.map_err(Into::into)
    }

    async fn write_mutable(&self, db: &DatabaseConnection) -> Result<Self> {
        let booking = umrah_booking::ActiveModel {
            id: Unchanged(self.id),
            ..mutable_fields(self)
        };
        booking.update(db).await.map_err(Into::into)
    }
}

/// Active model carrying every editable field, derived fields recomputed.
fn mutable_fields(record: &umrah_booking::Model) -> umrah_booking::ActiveModel {
    umrah_booking::ActiveModel {
        passenger_name: Set(record.passenger_name.trim().to_string()),
        passport_number: Set(record.passport_number.trim().to_string()),
        package_name: Set(record.package_name.trim().to_string()),
        booking_date: Set(record.booking_date),
        passengers: Set(record.passengers),
        makkah_hotel: Set(record.makkah_hotel.clone()),
        makkah_check_in: Set(record.makkah_check_in),
        makkah_check_out: Set(record.makkah_check_out),
        makkah_nights: Set(nights(record.makkah_check_in, record.makkah_check_out)),
        madinah_hotel: Set(record.madinah_hotel.clone()),
        madinah_check_in: Set(record.madinah_check_in),
        madinah_check_out: Set(record.madinah_check_out),
        madinah_nights: Set(nights(record.madinah_check_in, record.madinah_check_out)),
        received: Set(record.received),
        payable: Set(record.payable),
        profit: Set(profit(record.received, record.payable)),
        payment_status: Set(record.payment_status.trim().to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_each_stay_recomputes_independently() {
        let mut umrah = umrah_booking::Model::blank("staff-1");
        umrah.set_field("makkahCheckIn", "2024-03-01").unwrap();
        assert_eq!(umrah.makkah_nights, None);
        let touched = umrah.set_field("makkah_check_out", "2024-03-06").unwrap();
        assert_eq!(touched, vec!["makkah_nights"]);
        assert_eq!(umrah.makkah_nights, Some(5));
        assert_eq!(umrah.madinah_nights, None);

        umrah.set_field("madinah_check_in", "2024-03-06").unwrap();
        umrah.set_field("madinah_check_out", "2024-03-05").unwrap();
        assert_eq!(umrah.madinah_nights, Some(0));
        assert_eq!(umrah.field_text("makkah_nights").as_deref(), Some("5"));
    }

    #[test]
    fn test_clearing_a_date_returns_to_not_computed() {
        let mut umrah = umrah_booking::Model::blank("staff-1");
        umrah.set_field("makkah_check_in", "2024-03-01").unwrap();
        umrah.set_field("makkah_check_out", "2024-03-04").unwrap();
        umrah.set_field("makkah_check_out", "").unwrap();
        assert_eq!(umrah.makkah_nights, None);
        assert_eq!(umrah.field_text("makkah_nights").as_deref(), Some(""));
    }

    #[test]
    fn test_profit_from_received_and_payable() {
        let mut umrah = umrah_booking::Model::blank("staff-1");
        umrah.set_field("received", "250000").unwrap();
        assert_eq!(umrah.profit, 250_000.0);
        umrah.set_field("payable", "210000").unwrap();
        assert_eq!(umrah.profit, 40_000.0);
        assert_eq!(umrah.financials().profit, 40_000.0);
    }

    #[tokio::test]
    async fn test_insert_persists_derived_fields() -> Result<()> {
        let store = setup_test_store().await?;
        let mut draft = sample_umrah("staff-1", "Bilal Ahmed", "2024-03-01");
        draft.set_field("makkah_check_in", "2024-03-02")?;
        draft.set_field("makkah_check_out", "2024-03-09")?;
        let saved = store.insert(&draft).await?;
        assert_eq!(saved.makkah_nights, Some(7));
        assert_eq!(saved.madinah_nights, None);
        assert_eq!(saved.profit, 40_000.0);
        assert_eq!(saved.created_by_uid, "staff-1");
        Ok(())
    }
}
