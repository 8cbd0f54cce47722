//! Record editor.
//!
//! One editor per record: `Idle -> Editing -> Saving -> Idle`, with cancel
//! returning `Editing -> Idle`. The draft is a copy of the displayed record and
//! every field change re-runs the record's derivations. Saving re-reads the
//! authoritative record and refuses to write unless the actor owns it; only the
//! record type's mutable fields are written. A failed save keeps the draft.

use crate::{
    core::{notify::Notifier, record::BookingRecord, session::Actor, store::Store},
    errors::{Error, Result},
};
use tracing::{debug, info, warn};

/// Where an editor is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState<R> {
    /// No draft
    Idle,
    /// Draft open for changes
    Editing(R),
    /// Draft being written; further saves are refused
    Saving(R),
}

/// Editor for a single record.
#[derive(Debug)]
pub struct RecordEditor<R> {
    state: EditorState<R>,
}

impl<R: BookingRecord> Default for RecordEditor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BookingRecord> RecordEditor<R> {
    /// Editor with no draft.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EditorState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &EditorState<R> {
        &self.state
    }

    /// Current draft, while editing or saving.
    #[must_use]
    pub const fn draft(&self) -> Option<&R> {
        match &self.state {
            EditorState::Editing(draft) | EditorState::Saving(draft) => Some(draft),
            EditorState::Idle => None,
        }
    }

    /// Whether a save is in flight; the save control should be disabled.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        matches!(self.state, EditorState::Saving(_))
    }

    /// Opens a draft copied from the displayed record.
    ///
    /// Any previous draft is discarded. Refused while a save is in flight.
    pub fn begin(&mut self, displayed: &R) -> Result<()> {
        if let EditorState::Saving(draft) = &self.state {
            return Err(Error::SaveInProgress { id: draft.id() });
        }
        let mut draft = displayed.clone();
        draft.recompute();
        debug!(kind = %R::KIND, id = draft.id(), "Editing booking");
        self.state = EditorState::Editing(draft);
        Ok(())
    }

    /// Changes one draft field and recomputes derived fields.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<Vec<&'static str>> {
        match &mut self.state {
            EditorState::Editing(draft) => draft.set_field(name, value),
            EditorState::Saving(draft) => Err(Error::SaveInProgress { id: draft.id() }),
            EditorState::Idle => Err(Error::NotEditing),
        }
    }

    /// Discards the draft.
    pub fn cancel(&mut self) -> Result<()> {
        match &self.state {
            EditorState::Saving(draft) => Err(Error::SaveInProgress { id: draft.id() }),
            _ => {
                self.state = EditorState::Idle;
                Ok(())
            }
        }
    }

    /// Moves `Editing -> Saving` and hands out the draft to write.
    pub fn start_save(&mut self) -> Result<R> {
        match std::mem::replace(&mut self.state, EditorState::Idle) {
            EditorState::Editing(mut draft) => {
                draft.recompute();
                self.state = EditorState::Saving(draft.clone());
                Ok(draft)
            }
            EditorState::Saving(draft) => {
                let id = draft.id();
                self.state = EditorState::Saving(draft);
                Err(Error::SaveInProgress { id })
            }
            EditorState::Idle => Err(Error::NotEditing),
        }
    }

    /// Completes a save started with [`Self::start_save`].
    ///
    /// Success returns to `Idle`; failure returns to `Editing` with the draft
    /// intact. Either way the outcome is posted to `notifier`.
    pub fn finish_save(&mut self, outcome: Result<R>, notifier: &dyn Notifier) -> Result<R> {
        let state = std::mem::replace(&mut self.state, EditorState::Idle);
        let EditorState::Saving(draft) = state else {
            self.state = state;
            return Err(Error::NotEditing);
        };
        match outcome {
            Ok(saved) => {
                info!(kind = %R::KIND, id = saved.id(), "Booking saved");
                notifier.success(format!("{} booking updated", R::KIND));
                Ok(saved)
            }
            Err(err) => {
                warn!(kind = %R::KIND, id = draft.id(), "Save failed: {err}");
                notifier.error(format!("Could not save {} booking: {err}", R::KIND));
                self.state = EditorState::Editing(draft);
                Err(err)
            }
        }
    }

    /// Runs a whole save: guard, ownership re-check, write, outcome.
    pub async fn save(&mut self, store: &Store, actor: &Actor, notifier: &dyn Notifier) -> Result<R> {
        let draft = self.start_save()?;
        let outcome = commit(store, actor, &draft).await;
        self.finish_save(outcome, notifier)
    }
}

/// Re-checks ownership against the store, then writes the mutable fields.
///
/// The cached copy is never trusted: if the authoritative record is missing or
/// owned by someone else, nothing is written.
pub async fn commit<R: BookingRecord>(store: &Store, actor: &Actor, draft: &R) -> Result<R> {
    let current = store
        .fetch::<R>(draft.id())
        .await?
        .ok_or(Error::RecordNotFound {
            kind: R::KIND,
            id: draft.id(),
        })?;
    if !actor.owns(current.owner()) {
        warn!(
            kind = %R::KIND,
            id = draft.id(),
            actor = %actor.uid,
            "Rejected save of booking owned by someone else"
        );
        return Err(Error::NotOwner {
            kind: R::KIND,
            id: draft.id(),
            actor: actor.uid.clone(),
        });
    }
    let mut record = draft.clone();
    record.recompute();
    let mut saved = store.update(&record).await?;
    saved.recompute();
    Ok(saved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::notify::NoticeLevel;
    use crate::entities::visa_booking;
    use crate::errors::ErrorCategory;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_state_machine_transitions() {
        let mut editor = RecordEditor::<visa_booking::Model>::new();
        assert!(matches!(editor.set_field("country", "Oman"), Err(Error::NotEditing)));

        let record = sample_visa("staff-1", "AB123", "Turkey", "2024-05-01");
        editor.begin(&record).unwrap();
        editor.set_field("receivedFee", "1000").unwrap();
        assert_eq!(editor.draft().unwrap().profit, 0.0);
        assert_eq!(record.profit, 600.0);

        editor.cancel().unwrap();
        assert_eq!(editor.state(), &EditorState::Idle);
    }

    #[test]
    fn test_second_save_refused_while_saving() {
        let mut editor = RecordEditor::new();
        editor
            .begin(&sample_visa("staff-1", "AB123", "Turkey", "2024-05-01"))
            .unwrap();
        editor.start_save().unwrap();
        assert!(editor.is_saving());
        assert!(matches!(editor.start_save(), Err(Error::SaveInProgress { .. })));
        assert!(matches!(
            editor.set_field("country", "Oman"),
            Err(Error::SaveInProgress { .. })
        ));
        assert!(editor.cancel().is_err());
        assert!(editor.is_saving());
    }

    #[test]
    fn test_failed_save_returns_to_editing_with_draft() {
        let notifier = RecordingNotifier::default();
        let mut editor = RecordEditor::new();
        editor
            .begin(&sample_visa("staff-1", "AB123", "Turkey", "2024-05-01"))
            .unwrap();
        editor.set_field("country", "Oman").unwrap();
        editor.start_save().unwrap();

        let result = editor.finish_save(
            Err(Error::Subscription {
                message: "offline".to_string(),
            }),
            &notifier,
        );
        assert!(result.is_err());
        assert!(matches!(editor.state(), EditorState::Editing(_)));
        assert_eq!(editor.draft().unwrap().country, "Oman");
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_save_writes_changes_and_returns_to_idle() -> Result<()> {
        let store = setup_test_store().await?;
        let actor = Actor::new("staff-1");
        let notifier = RecordingNotifier::default();
        let saved = store
            .insert(&sample_visa("staff-1", "AB123", "Turkey", "2024-05-01"))
            .await?;

        let mut editor = RecordEditor::new();
        editor.begin(&saved)?;
        editor.set_field("receivedFee", "1000")?;
        let updated = editor.save(&store, &actor, &notifier).await?;

        assert_eq!(editor.state(), &EditorState::Idle);
        assert_eq!(updated.received_fee, Some(1000.0));
        assert_eq!(updated.profit, 0.0);
        assert_eq!(updated.visa_status, saved.visa_status);
        assert_eq!(updated.user_id, "staff-1");
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Success);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_rejected_for_other_owner_keeps_store_untouched() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = RecordingNotifier::default();
        let saved = store
            .insert(&sample_visa("staff-1", "AB123", "Turkey", "2024-05-01"))
            .await?;

        // The cached copy claims staff-2 owns it; the store says otherwise.
        let mut forged = saved.clone();
        forged.user_id = "staff-2".to_string();
        let mut editor = RecordEditor::new();
        editor.begin(&forged)?;
        editor.set_field("country", "Oman")?;
        let err = editor
            .save(&store, &Actor::new("staff-2"), &notifier)
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Authorization);
        assert!(matches!(editor.state(), EditorState::Editing(_)));
        let stored = store.fetch::<visa_booking::Model>(saved.id).await?.unwrap();
        assert_eq!(stored.country, "Turkey");
        Ok(())
    }

    #[tokio::test]
    async fn test_ownership_failure_never_issues_write() {
        let mut authoritative = sample_visa("staff-1", "AB123", "Turkey", "2024-05-01");
        authoritative.id = 5;
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![authoritative.clone()]])
            .into_connection();
        let store = Store::new(db);

        let result = commit(&store, &Actor::new("staff-9"), &authoritative).await;
        assert!(matches!(result, Err(Error::NotOwner { id: 5, .. })));

        // Only the ownership read reached the database.
        let log = store.into_connection().unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_fails_closed() -> Result<()> {
        let store = setup_test_store().await?;
        let mut ghost = sample_visa("staff-1", "AB123", "Turkey", "2024-05-01");
        ghost.id = 404;
        let result = commit(&store, &Actor::new("staff-1"), &ghost).await;
        assert!(matches!(result, Err(Error::RecordNotFound { id: 404, .. })));
        Ok(())
    }
}
