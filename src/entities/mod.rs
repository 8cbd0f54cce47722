//! Entity module - SeaORM definitions for the booking collections.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod hotel_booking;
pub mod umrah_booking;
pub mod visa_booking;

// Re-export specific types to avoid conflicts
pub use hotel_booking::{
    Column as HotelBookingColumn, Entity as HotelBooking, Model as HotelBookingModel,
};
pub use umrah_booking::{
    Column as UmrahBookingColumn, Entity as UmrahBooking, Model as UmrahBookingModel,
};
pub use visa_booking::{
    Column as VisaBookingColumn, Entity as VisaBooking, Model as VisaBookingModel,
};
