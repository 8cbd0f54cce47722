/// Live record cache fed by store subscriptions
pub mod cache;
/// Pure derived-field calculations
pub mod derive;
/// Record editor state machine and ownership-checked saves
pub mod editor;
/// Form text parsing helpers shared by the booking types
pub mod fields;
/// View filter pipeline: status, date window and search
pub mod filter;
/// Creation forms
pub mod form;
/// Hotel bookings
pub mod hotel;
/// User-facing notifications
pub mod notify;
/// Booking list pages
pub mod page;
/// The booking record abstraction and its sum type
pub mod record;
/// Report exporter
pub mod report;
/// Acting staff member
pub mod session;
/// Store adapter and live query subscriptions
pub mod store;
/// Umrah package bookings
pub mod umrah;
/// Visa applications
pub mod visa;
