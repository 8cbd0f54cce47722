//! Visa booking entity - one visa application handled for a client.
//!
//! Fee fields are optional so that a blank form field stays distinguishable
//! from an explicit zero. `profit` is derived from `total_fee` and
//! `received_fee` and is recomputed before every save.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Visa booking database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visa_bookings")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Passport number of the applicant
    pub passport: String,
    /// Applicant's full name
    pub full_name: String,
    /// Visa category (e.g. "visit", "work")
    pub visa_type: String,
    /// Destination country
    pub country: String,
    /// Booking date
    pub date: Option<Date>,
    /// Fee quoted to the client
    pub total_fee: Option<f64>,
    /// Fee received so far
    pub received_fee: Option<f64>,
    /// Outstanding amount as entered by staff
    pub remaining_fee: Option<f64>,
    /// Derived: `total_fee - received_fee`
    pub profit: f64,
    /// Payment progress (e.g. "paid", "partial", "unpaid")
    pub payment_status: String,
    /// Application progress (e.g. "pending", "approved", "rejected")
    pub visa_status: String,
    /// Fee paid to the embassy
    pub embassy_fee: Option<f64>,
    /// Date the file went to the embassy
    pub sent_to_embassy: Option<Date>,
    /// Date the passport came back from the embassy
    pub receive_from_embassy: Option<Date>,
    /// Client contact email
    pub email: Option<String>,
    /// `"direct"` or `"vendor"`; vendor fields only apply to the latter
    pub source: String,
    /// Vendor contact, when processed through a vendor
    pub vendor_contact: Option<String>,
    /// Vendor's fee, when processed through a vendor
    pub vendor_fee: Option<f64>,
    /// Uid of the staff member who created the booking
    pub user_id: String,
    /// When the booking was created
    pub created_at: DateTimeUtc,
}

/// Visa bookings have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
