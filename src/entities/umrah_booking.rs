//! Umrah booking entity - a package booking with Makkah and Madinah stays.
//!
//! Night counts for both stays and `profit` are derived fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Umrah booking database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "umrah_bookings")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lead passenger's name
    pub passenger_name: String,
    /// Lead passenger's passport number
    pub passport_number: String,
    /// Package sold (e.g. "Economy 15 days")
    pub package_name: String,
    /// Booking date
    pub booking_date: Option<Date>,
    /// Number of passengers on the booking
    pub passengers: Option<i32>,
    /// Hotel in Makkah
    pub makkah_hotel: Option<String>,
    /// Makkah check-in
    pub makkah_check_in: Option<Date>,
    /// Makkah check-out
    pub makkah_check_out: Option<Date>,
    /// Derived: nights in Makkah, `None` until both dates are known
    pub makkah_nights: Option<i64>,
    /// Hotel in Madinah
    pub madinah_hotel: Option<String>,
    /// Madinah check-in
    pub madinah_check_in: Option<Date>,
    /// Madinah check-out
    pub madinah_check_out: Option<Date>,
    /// Derived: nights in Madinah, `None` until both dates are known
    pub madinah_nights: Option<i64>,
    /// Amount received from the client
    pub received: Option<f64>,
    /// Amount payable to suppliers
    pub payable: Option<f64>,
    /// Derived: `received - payable`
    pub profit: f64,
    /// Payment progress
    pub payment_status: String,
    /// Uid of the staff member who created the booking
    pub created_by_uid: String,
    /// When the booking was created
    pub created_at: DateTimeUtc,
}

/// Umrah bookings have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
