//! Hotel booking entity.
//!
//! `nights_stayed` and `profit` are derived fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hotel booking database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hotel_bookings")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Guest's name
    pub guest_name: String,
    /// Guest's passport number
    pub passport_number: Option<String>,
    /// Property booked; shown as "property" in forms
    pub hotel_name: String,
    /// City of the property
    pub city: String,
    /// Booking date
    pub booking_date: Option<Date>,
    /// Check-in date
    pub check_in: Option<Date>,
    /// Check-out date
    pub check_out: Option<Date>,
    /// Derived: nights between check-in and check-out
    pub nights_stayed: Option<i64>,
    /// Number of rooms
    pub rooms: Option<i32>,
    /// Room category
    pub room_type: Option<String>,
    /// Amount received from the guest
    pub received: Option<f64>,
    /// Amount payable to the property
    pub payable: Option<f64>,
    /// Derived: `received - payable`
    pub profit: f64,
    /// Booking progress (e.g. "confirmed", "cancelled")
    pub booking_status: String,
    /// Uid of the staff member who created the booking
    pub created_by_uid: String,
    /// When the booking was created
    pub created_at: DateTimeUtc,
}

/// Hotel bookings have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
