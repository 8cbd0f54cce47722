//! Shared test utilities for the travel desk.
//!
//! This module provides an in-memory store, a notifier that records what it is
//! told, and booking builders with sensible defaults. Derived fields on the
//! builders are already computed.

use crate::{
    core::{
        notify::{Notice, Notifier},
        record::BookingRecord,
        store::Store,
    },
    entities::{hotel_booking, umrah_booking, visa_booking},
    errors::Result,
};
use chrono::NaiveDate;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<Store> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(Store::new(db))
}

/// Notifier that keeps every notice for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Notices received so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

fn day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Creates an unsaved visa application.
///
/// # Defaults
/// * `full_name`: "Test Applicant"
/// * `visa_type`: "Tourist"
/// * `total_fee`: 1000, `received_fee`: 400 (profit 600)
/// * `payment_status`: "partial", `visa_status`: "pending"
/// * `source`: direct
pub fn sample_visa(owner: &str, passport: &str, country: &str, date: &str) -> visa_booking::Model {
    let mut visa = visa_booking::Model::blank(owner);
    visa.passport = passport.to_string();
    visa.full_name = "Test Applicant".to_string();
    visa.visa_type = "Tourist".to_string();
    visa.country = country.to_string();
    visa.date = day(date);
    visa.total_fee = Some(1000.0);
    visa.received_fee = Some(400.0);
    visa.remaining_fee = Some(600.0);
    visa.payment_status = "partial".to_string();
    visa.visa_status = "pending".to_string();
    visa.recompute();
    visa
}

/// Creates an unsaved Umrah booking dated `date`.
///
/// # Defaults
/// * `received`: 250000, `payable`: 210000 (profit 40000)
/// * `passengers`: 2
/// * no hotel stays
pub fn sample_umrah(owner: &str, passenger: &str, date: &str) -> umrah_booking::Model {
    let mut umrah = umrah_booking::Model::blank(owner);
    umrah.passenger_name = passenger.to_string();
    umrah.passport_number = "PK1234567".to_string();
    umrah.package_name = "Economy 15 Days".to_string();
    umrah.booking_date = day(date);
    umrah.passengers = Some(2);
    umrah.received = Some(250_000.0);
    umrah.payable = Some(210_000.0);
    umrah.payment_status = "paid".to_string();
    umrah.recompute();
    umrah
}

/// Creates an unsaved hotel booking, booked on the check-in date.
///
/// # Defaults
/// * `hotel_name`: "Pearl Continental", `city`: "Lahore"
/// * `received`: 80000, `payable`: 60000 (profit 20000)
/// * `booking_status`: "confirmed"
pub fn sample_hotel(owner: &str, guest: &str, check_in: &str, check_out: &str) -> hotel_booking::Model {
    let mut hotel = hotel_booking::Model::blank(owner);
    hotel.guest_name = guest.to_string();
    hotel.hotel_name = "Pearl Continental".to_string();
    hotel.city = "Lahore".to_string();
    hotel.booking_date = day(check_in);
    hotel.check_in = day(check_in);
    hotel.check_out = day(check_out);
    hotel.rooms = Some(1);
    hotel.received = Some(80_000.0);
    hotel.payable = Some(60_000.0);
    hotel.booking_status = "confirmed".to_string();
    hotel.recompute();
    hotel
}
