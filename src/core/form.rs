//! Creation forms.
//!
//! A [`BookingForm`] starts from a blank record owned by the acting staff
//! member. Field changes recompute derived fields immediately; submit checks
//! required fields before anything reaches the store and keeps the form
//! contents when it fails.

use crate::{
    core::{notify::Notifier, record::BookingRecord, session::Actor, store::Store},
    errors::Result,
};
use tracing::{info, warn};

/// Form for a new booking.
#[derive(Debug, Clone)]
pub struct BookingForm<R> {
    draft: R,
    created_by: String,
}

impl<R: BookingRecord> BookingForm<R> {
    /// Blank form owned by `actor`.
    #[must_use]
    pub fn new(actor: &Actor) -> Self {
        let mut draft = R::blank(&actor.uid);
        draft.recompute();
        Self {
            draft,
            created_by: actor.label().to_string(),
        }
    }

    /// Record as currently entered, derived fields included.
    #[must_use]
    pub const fn draft(&self) -> &R {
        &self.draft
    }

    /// Changes one field; returns the derived fields that depend on it.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<Vec<&'static str>> {
        self.draft.set_field(name, value)
    }

    /// Sets several fields in order, stopping at the first invalid one.
    pub fn fill<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<()> {
        for (name, value) in values {
            self.set_field(name, value)?;
        }
        Ok(())
    }

    /// Validates and inserts the booking.
    ///
    /// A validation failure is reported and nothing is sent to the store.
    pub async fn submit(&self, store: &Store, notifier: &dyn Notifier) -> Result<R> {
        if let Err(err) = self.draft.validate_required() {
            warn!(kind = %R::KIND, "Rejected booking form: {err}");
            notifier.error(err.to_string());
            return Err(err);
        }
        match store.insert(&self.draft).await {
            Ok(mut saved) => {
                saved.recompute();
                info!(kind = %R::KIND, id = saved.id(), "Booking created");
                notifier.success(format!(
                    "{} booking {} created by {}",
                    R::KIND,
                    saved.id(),
                    self.created_by
                ));
                Ok(saved)
            }
            Err(err) => {
                notifier.error(format!("Could not create {} booking: {err}", R::KIND));
                Err(err)
            }
        }
    }

    /// Clears the form back to a blank record for the same owner.
    pub fn reset(&mut self) {
        let owner = self.draft.owner().to_string();
        self.draft = R::blank(&owner);
        self.draft.recompute();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::notify::NoticeLevel;
    use crate::entities::{hotel_booking, visa_booking};
    use crate::errors::Error;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_missing_field_aborts_before_store_call() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let store = Store::new(db);
        let notifier = RecordingNotifier::default();
        let mut form = BookingForm::<visa_booking::Model>::new(&Actor::new("staff-1"));
        form.fill([("passport", "AB123"), ("fullName", "Ayesha Siddiqui")])
            .unwrap();

        let result = form.submit(&store, &notifier).await;
        assert!(matches!(result, Err(Error::MissingField { field: "visa_type" })));
        assert_eq!(form.draft().passport, "AB123");
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);
        assert!(store.into_connection().unwrap().into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_submit_creates_booking_owned_by_actor() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = RecordingNotifier::default();
        let mut form =
            BookingForm::<hotel_booking::Model>::new(&Actor::new("staff-3").with_name("Hina"));
        form.fill([
            ("guestName", "Sara Khan"),
            ("property", "Pearl Continental"),
            ("city", "Lahore"),
            ("checkIn", "2024-07-10"),
            ("checkOut", "2024-07-13"),
            ("received", "45000"),
            ("payable", "39000"),
            ("status", "confirmed"),
        ])?;
        assert_eq!(form.draft().nights_stayed, Some(3));
        assert_eq!(form.draft().profit, 6000.0);

        let saved = form.submit(&store, &notifier).await?;
        assert!(saved.id > 0);
        assert_eq!(saved.created_by_uid, "staff-3");
        assert_eq!(saved.nights_stayed, Some(3));
        let notice = &notifier.notices()[0];
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, format!("hotel booking {} created by Hina", saved.id));

        form.reset();
        assert_eq!(form.draft().guest_name, "");
        assert_eq!(form.draft().created_by_uid, "staff-3");
        Ok(())
    }

    #[test]
    fn test_blank_after_trim_is_missing() {
        let mut form = BookingForm::<hotel_booking::Model>::new(&Actor::new("staff-3"));
        form.fill([("guest_name", "   ")]).unwrap();
        assert!(matches!(
            form.draft().validate_required(),
            Err(Error::MissingField { field: "guest_name" })
        ));
    }
}
