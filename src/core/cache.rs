//! Live record cache.
//!
//! A [`LiveCache`] consumes a [`Subscription`] and keeps a local, ordered copy
//! of the collection. Every snapshot is materialized (derived fields
//! recomputed, optional dedup by natural key) and replaces the whole list at
//! once. A failed subscription posts an error notice, clears the loading flag
//! and stops; retrying is left to the store client.

use crate::{
    core::{
        notify::Notifier,
        record::BookingRecord,
        store::{Subscription, subscription_error},
    },
    errors::{Error, Result},
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

#[derive(Debug)]
struct CacheState<R> {
    records: Vec<R>,
    loading: bool,
    error: Option<String>,
}

/// Locally held, always-complete projection of a standing query.
#[derive(Debug)]
pub struct LiveCache<R> {
    state: Arc<RwLock<CacheState<R>>>,
    revision: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl<R: BookingRecord> LiveCache<R> {
    /// Starts consuming `subscription`.
    ///
    /// With `dedup`, records sharing a dedup key collapse to the newest one.
    pub fn attach(mut subscription: Subscription<R>, dedup: bool, notifier: Arc<dyn Notifier>) -> Self {
        let state = Arc::new(RwLock::new(CacheState {
            records: Vec::new(),
            loading: true,
            error: None,
        }));
        let (revision_tx, revision) = watch::channel(0_u64);
        let task_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            while let Some(mut snapshot) = subscription.next().await {
                if let Some(newer) = subscription.latest_queued() {
                    trace!(kind = %R::KIND, "Coalescing queued snapshots");
                    snapshot = newer;
                }
                match snapshot {
                    Ok(raw) => {
                        let records = materialize(raw, dedup);
                        debug!(kind = %R::KIND, count = records.len(), "Cache refreshed");
                        let mut guard = task_state.write().await;
                        guard.records = records;
                        guard.loading = false;
                        guard.error = None;
                        drop(guard);
                        revision_tx.send_modify(|rev| *rev += 1);
                    }
                    Err(err) => {
                        let err = subscription_error(R::KIND, &err);
                        error!(kind = %R::KIND, "{err}");
                        notifier.error(err.to_string());
                        let mut guard = task_state.write().await;
                        guard.loading = false;
                        guard.error = Some(err.to_string());
                        drop(guard);
                        revision_tx.send_modify(|rev| *rev += 1);
                        return;
                    }
                }
            }
            info!(kind = %R::KIND, "Subscription ended");
            task_state.write().await.loading = false;
        });

        Self {
            state,
            revision,
            task,
        }
    }

    /// Copy of the current list.
    pub async fn records(&self) -> Vec<R> {
        self.state.read().await.records.clone()
    }

    /// Current list record by identifier.
    pub async fn get(&self, id: i64) -> Option<R> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Whether no snapshot or error has arrived yet.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Message of the failure that stopped the cache, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Waits until the list is replaced or the cache records a failure.
    ///
    /// Returns an error once the cache has stopped and nothing new is pending.
    pub async fn changed(&mut self) -> Result<()> {
        self.revision.changed().await.map_err(|_| Error::Subscription {
            message: format!("{} cache is no longer live", R::KIND),
        })
    }

    /// Tears down the cache and its subscription.
    pub fn close(self) {
        drop(self);
    }
}

impl<R> Drop for LiveCache<R> {
    fn drop(&mut self) {
        // Aborting drops the subscription inside the task, which cancels the query.
        self.task.abort();
    }
}

/// Recomputes derived fields and, with `dedup`, keeps the newest record per
/// dedup key.
#[must_use]
pub fn materialize<R: BookingRecord>(mut records: Vec<R>, dedup: bool) -> Vec<R> {
    records.iter_mut().for_each(BookingRecord::recompute);
    if !dedup {
        return records;
    }
    sort_newest_first(&mut records);
    let mut seen = HashSet::new();
    records.retain(|record| record.dedup_key().is_none_or(|key| seen.insert(key)));
    records
}

/// Orders by record date descending, undated last, then by creation time.
pub fn sort_newest_first<R: BookingRecord>(records: &mut [R]) {
    records.sort_by(|a, b| {
        b.record_date()
            .cmp(&a.record_date())
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });
}
