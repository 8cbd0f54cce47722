//! Store adapter and live query subscriptions.
//!
//! [`Store`] wraps the database connection and publishes a [`ChangeEvent`] on a
//! broadcast channel after every successful write. A [`Subscription`] is a
//! standing query: a background task re-runs the query whenever its collection
//! changes and pushes the full result set. Snapshots are never partial.

use crate::{
    core::record::{BookingKind, BookingRecord, RecordQuery},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A write landed in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Collection written to
    pub kind: BookingKind,
    /// Identifier of the record written
    pub id: i64,
}

/// Handle to the booking store.
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<DatabaseConnection>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Store {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            db: Arc::new(db),
            changes,
        }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let db = crate::config::database::create_connection(url).await?;
        Ok(Self::new(db))
    }

    /// Underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Takes the connection back, if no clone of the store or live
    /// subscription still shares it.
    #[cfg(test)]
    pub fn into_connection(self) -> Option<DatabaseConnection> {
        Arc::try_unwrap(self.db).ok()
    }

    /// Number of live subscriptions listening for writes.
    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Inserts a new record and notifies subscribers.
    #[instrument(skip(self, record), fields(collection = R::KIND.collection(), owner = record.owner()))]
    pub async fn insert<R: BookingRecord>(&self, record: &R) -> Result<R> {
        let saved = record.insert_new(&self.db).await?;
        debug!(id = saved.id(), "Inserted booking");
        self.publish(R::KIND, saved.id());
        Ok(saved)
    }

    /// Writes a record's mutable fields and notifies subscribers.
    #[instrument(skip(self, record), fields(collection = R::KIND.collection(), id = record.id()))]
    pub async fn update<R: BookingRecord>(&self, record: &R) -> Result<R> {
        let saved = record.write_mutable(&self.db).await?;
        debug!("Updated booking");
        self.publish(R::KIND, saved.id());
        Ok(saved)
    }

    /// Authoritative read by identifier.
    pub async fn fetch<R: BookingRecord>(&self, id: i64) -> Result<Option<R>> {
        R::fetch_by_id(&self.db, id).await
    }

    /// Starts a standing query.
    ///
    /// The first snapshot is delivered as soon as the initial query finishes;
    /// later snapshots follow every write to the collection. A failed query is
    /// delivered once and ends the stream. Must be called within a tokio
    /// runtime.
    pub fn subscribe<R: BookingRecord>(&self, query: RecordQuery) -> Subscription<R> {
        // Subscribe before the first query so no write between the two is missed.
        let mut changes = self.changes.subscribe();
        let db = Arc::clone(&self.db);
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            loop {
                let snapshot = R::fetch_all(&db, &query).await;
                let failed = snapshot.is_err();
                if tx.send(snapshot).is_err() || failed {
                    return;
                }
                if !wait_for_change(&mut changes, R::KIND).await {
                    return;
                }
            }
        });

        Subscription { rx, task }
    }

    fn publish(&self, kind: BookingKind, id: i64) {
        // No receivers just means nothing is subscribed right now.
        if self.changes.send(ChangeEvent { kind, id }).is_err() {
            trace!(%kind, id, "No live subscriptions to notify");
        }
    }
}

/// Waits for a write to `kind`. Returns `false` once the store is gone.
async fn wait_for_change(changes: &mut broadcast::Receiver<ChangeEvent>, kind: BookingKind) -> bool {
    loop {
        match changes.recv().await {
            Ok(event) if event.kind == kind => return true,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(%kind, skipped, "Subscription lagged, re-querying");
                return true;
            }
            Err(broadcast::error::RecvError::Closed) => return false,
        }
    }
}

/// A standing query delivering full snapshots.
///
/// Dropping the subscription cancels the background query task.
#[derive(Debug)]
pub struct Subscription<R> {
    rx: mpsc::UnboundedReceiver<Result<Vec<R>>>,
    task: JoinHandle<()>,
}

impl<R> Subscription<R> {
    /// Next snapshot, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<Vec<R>>> {
        self.rx.recv().await
    }

    /// Most recent snapshot already queued, discarding older ones.
    ///
    /// Returns `None` when nothing is queued.
    pub fn latest_queued(&mut self) -> Option<Result<Vec<R>>> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Cancels the standing query.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the background query task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Converts a subscription failure into the error staff are shown.
#[must_use]
pub fn subscription_error(kind: BookingKind, err: &Error) -> Error {
    Error::Subscription {
        message: format!("Failed to load {kind} bookings: {err}"),
    }
}
