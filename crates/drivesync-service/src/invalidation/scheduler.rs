//! Coalesced refetching of stale views.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, trace, warn};

use drivesync_cache::ViewIndex;
use drivesync_core::config::scheduler::SchedulerConfig;
use drivesync_core::events::ViewEvent;
use drivesync_core::result::AppResult;
use drivesync_entity::{FetchedView, ViewKey, ViewPayload, ViewRow};

use crate::events::EventBus;
use crate::sync::lock;

/// Result of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Views whose refetch landed.
    pub refetched: usize,
    /// Views whose refetch failed.
    pub failed: usize,
}

/// Queues stale views and refetches each one once per coalescing window.
///
/// Scheduling the same key any number of times before the window closes
/// produces a single refetch. Views that are no longer registered when the
/// window closes are skipped.
#[derive(Debug, Clone)]
pub struct InvalidationScheduler {
    inner: Arc<SchedulerInner>,
}

#[derive(Debug)]
struct SchedulerInner {
    views: Arc<ViewIndex>,
    events: EventBus,
    window: Duration,
    /// Keys waiting for the next flush.
    pending: Mutex<BTreeSet<ViewKey>>,
    /// Whether a flush timer is already running.
    armed: AtomicBool,
}

impl InvalidationScheduler {
    /// Create a scheduler that flushes `window` after the first schedule.
    pub fn new(views: Arc<ViewIndex>, events: EventBus, window: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                views,
                events,
                window,
                pending: Mutex::new(BTreeSet::new()),
                armed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a scheduler from configuration.
    pub fn from_config(views: Arc<ViewIndex>, events: EventBus, config: &SchedulerConfig) -> Self {
        Self::new(views, events, Duration::from_millis(config.coalesce_window_ms))
    }

    /// The coalescing window.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Marks `key` stale and schedules its refetch.
    pub fn invalidate(&self, key: ViewKey) {
        if self.inner.views.mark_stale(&key) {
            self.schedule(key);
        }
    }

    /// Queues `key` for the next flush.
    ///
    /// Inside a Tokio runtime the first schedule of a window arms a timer
    /// that flushes when the window closes. Outside one, call
    /// [`flush`](Self::flush) yourself.
    pub fn schedule(&self, key: ViewKey) {
        let queued = lock(&self.inner.pending).insert(key.clone());
        if queued {
            trace!(view = %key, "Refetch scheduled");
            self.inner.events.publish(ViewEvent::Stale {
                view: key.to_string(),
            });
        }
        self.arm();
    }

    /// Keys waiting for the next flush.
    pub fn pending(&self) -> Vec<ViewKey> {
        lock(&self.inner.pending).iter().cloned().collect()
    }

    /// Refetches every queued view now, concurrently.
    pub async fn flush(&self) -> FlushSummary {
        let keys = std::mem::take(&mut *lock(&self.inner.pending));
        if keys.is_empty() {
            return FlushSummary::default();
        }

        let results = join_all(keys.iter().map(|key| self.refetch(key))).await;
        let mut summary = FlushSummary::default();
        for result in results {
            match result {
                Ok(true) => summary.refetched += 1,
                Ok(false) => {}
                Err(_) => summary.failed += 1,
            }
        }
        debug!(
            refetched = summary.refetched,
            failed = summary.failed,
            "Invalidation flush finished"
        );
        summary
    }

    /// Refetches one view: upserts the returned entities into the store and
    /// installs the new payload. Returns `false` if the view is not
    /// registered.
    ///
    /// On failure the view keeps its last-known payload and is flagged
    /// [`ViewStatus::Error`](drivesync_entity::ViewStatus::Error).
    pub async fn refetch(&self, key: &ViewKey) -> AppResult<bool> {
        let views = &self.inner.views;
        let Some(query) = views.begin_fetch(key) else {
            trace!(view = %key, "Skipping refetch of unregistered view");
            return Ok(false);
        };

        let result = match query(key.clone()).await {
            Ok(fetched) => self.absorb(key, fetched),
            Err(e) => Err(e),
        };

        match result {
            Ok(rows) => {
                debug!(view = %key, rows, "View refetched");
                self.inner.events.publish(ViewEvent::Refetched {
                    view: key.to_string(),
                    rows,
                });
                Ok(true)
            }
            Err(e) => {
                warn!(view = %key, error = %e, "View refetch failed");
                views.fail_fetch(key);
                self.inner.events.publish(ViewEvent::RefetchFailed {
                    view: key.to_string(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Folds a fetch result into the store and the view. Returns the row
    /// count.
    fn absorb(&self, key: &ViewKey, fetched: FetchedView) -> AppResult<usize> {
        let views = &self.inner.views;
        let payload = match fetched {
            FetchedView::Entities(entities) => {
                let mut rows = Vec::with_capacity(entities.len());
                for entity in entities {
                    let id = entity.id().clone();
                    let previous = views.store().upsert(entity.clone())?;
                    if previous.as_ref() != Some(&entity) {
                        views.republish_containing(&id);
                    }
                    rows.push(ViewRow::Confirmed(id));
                }
                ViewPayload::Rows(rows)
            }
            FetchedView::Stats(stats) => ViewPayload::Stats(stats),
        };
        let rows = payload.len();
        views.complete_fetch(key, payload);
        Ok(rows)
    }

    fn arm(&self) {
        if self.inner.armed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.inner.armed.store(false, Ordering::Release);
            debug!("No async runtime; stale views wait for an explicit flush");
            return;
        };

        let scheduler = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(scheduler.inner.window).await;
            scheduler.inner.armed.store(false, Ordering::Release);
            scheduler.flush().await;
        });
    }
}
