//! Hotel booking business logic.

use crate::{
    core::{
        derive::{nights, nights_text, profit},
        fields,
        record::{BookingKind, BookingRecord, Derivation, FieldDef, Financials, RecordQuery},
    },
    entities::{HotelBooking, hotel_booking},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue::Unchanged, QueryOrder, Set, prelude::*};

fn derive_nights(record: &mut hotel_booking::Model) {
    record.nights_stayed = nights(record.check_in, record.check_out);
}

fn derive_profit(record: &mut hotel_booking::Model) {
    record.profit = profit(record.received, record.payable);
}

#[async_trait]
impl BookingRecord for hotel_booking::Model {
    const KIND: BookingKind = BookingKind::Hotel;
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::aliased("guest_name", "Guest Name", &["name", "guestName"]),
        FieldDef::aliased("passport_number", "Passport No.", &["passport", "passportNumber"]),
        FieldDef::aliased("hotel_name", "Property", &["property", "hotel", "hotelName"]),
        FieldDef::new("city", "City"),
        FieldDef::aliased("booking_date", "Booking Date", &["date", "bookingDate"]),
        FieldDef::aliased("check_in", "Check-in", &["checkIn"]),
        FieldDef::aliased("check_out", "Check-out", &["checkOut"]),
        FieldDef::aliased("nights_stayed", "Nights", &["nights", "nightsStayed"]),
        FieldDef::new("rooms", "Rooms"),
        FieldDef::aliased("room_type", "Room Type", &["roomType"]),
        FieldDef::new("received", "Received"),
        FieldDef::new("payable", "Payable"),
        FieldDef::new("profit", "Profit"),
        FieldDef::aliased("booking_status", "Status", &["status", "bookingStatus"]),
    ];
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "guest_name",
        "hotel_name",
        "city",
        "check_in",
        "check_out",
        "received",
        "payable",
        "booking_status",
    ];
    const DERIVATIONS: &'static [Derivation<Self>] = &[
        Derivation {
            field: "nights_stayed",
            sources: &["check_in", "check_out"],
            apply: derive_nights,
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
            guest_name: String::new(),
            passport_number: None,
            hotel_name: String::new(),
            city: String::new(),
            booking_date: None,
            check_in: None,
            check_out: None,
            nights_stayed: None,
            rooms: None,
            room_type: None,
            received: None,
            payable: None,
            profit: 0.0,
            booking_status: String::new(),
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
        Some(self.booking_status.as_str()).filter(|s| !s.is_empty())
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut values = vec![self.guest_name.as_str(), self.hotel_name.as_str()];
        if let Some(passport) = &self.passport_number {
            values.push(passport);
        }
        values
    }

    fn report_identifiers(&self) -> (String, String) {
        (self.guest_name.clone(), self.hotel_name.clone())
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
            "guest_name" => self.guest_name.clone(),
            "passport_number" => fields::opt_text(self.passport_number.as_ref()),
            "hotel_name" => self.hotel_name.clone(),
            "city" => self.city.clone(),
            "booking_date" => fields::date_text(self.booking_date),
            "check_in" => fields::date_text(self.check_in),
            "check_out" => fields::date_text(self.check_out),
            "nights_stayed" => nights_text(self.nights_stayed),
            "rooms" => fields::opt_text(self.rooms.as_ref()),
            "room_type" => fields::opt_text(self.room_type.as_ref()),
            "received" => fields::amount_text(self.received),
            "payable" => fields::amount_text(self.payable),
            "profit" => self.profit.to_string(),
            "booking_status" => self.booking_status.clone(),
            _ => return None,
        };
        Some(text)
    }

    fn assign(&mut self, key: &'static str, value: &str) -> Result<()> {
        match key {
            "guest_name" => self.guest_name = value.to_string(),
            "passport_number" => self.passport_number = fields::optional_text(value),
            "hotel_name" => self.hotel_name = value.to_string(),
            "city" => self.city = value.to_string(),
            "booking_date" => self.booking_date = fields::date(key, value)?,
            "check_in" => self.check_in = fields::date(key, value)?,
            "check_out" => self.check_out = fields::date(key, value)?,
            "rooms" => self.rooms = fields::count(key, value)?,
            "room_type" => self.room_type = fields::optional_text(value),
            "received" => self.received = fields::amount(key, value)?,
            "payable" => self.payable = fields::amount(key, value)?,
            "booking_status" => self.booking_status = value.to_string(),
            _ => {
                return Err(Error::ReadOnlyField {
                    field: key.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn fetch_all(db: &DatabaseConnection, query: &RecordQuery) -> Result<Vec<Self>> {
        let mut select = HotelBooking::find();
        if let Some(owner) = &query.owner {
            select = select.filter(hotel_booking::Column::CreatedByUid.eq(owner.as_str()));
        }
        select
            .order_by_desc(hotel_booking::Column::CreatedAt)
            .order_by_desc(hotel_booking::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn fetch_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>> {
        HotelBooking::find_by_id(id).one(db).await.map_err(Into::into)
    }

    async fn insert_new(&self, db: &DatabaseConnection) -> Result<Self> {
        let booking = hotel_booking::ActiveModel {
            created_by_uid: Set(self.created_by_uid.clone()),
            created_at: Set(Utc::now()),
            ..mutable_fields(self)
        };
        booking.insert(db).await.map_err(Into::into)
    }

    async fn write_mutable(&self, db: &DatabaseConnection) -> Result<Self> {
        let booking = hotel_booking::ActiveModel {
            id: Unchanged(self.id),
            ..mutable_fields(self)
        };
        booking.update(db).await.map_err(Into::into)
    }
}

fn mutable_fields(record: &hotel_booking::Model) -> hotel_booking::ActiveModel {
    hotel_booking::ActiveModel {
        guest_name: Set(record.guest_name.trim().to_string()),
        passport_number: Set(record.passport_number.clone()),
        hotel_name: Set(record.hotel_name.trim().to_string()),
        city: Set(record.city.trim().to_string()),
        booking_date: Set(record.booking_date),
        check_in: Set(record.check_in),
        check_out: Set(record.check_out),
        nights_stayed: Set(nights(record.check_in, record.check_out)),
        rooms: Set(record.rooms),
        room_type: Set(record.room_type.clone()),
        received: Set(record.received),
        payable: Set(record.payable),
        profit: Set(profit(record.received, record.payable)),
        booking_status: Set(record.booking_status.trim().to_string()),
        ..Default::default()
    }
}
