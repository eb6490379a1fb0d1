//! The notification store.
//!
//! Each expiring notification owns one scheduled tokio task. The task holds a
//! weak reference to the feed, so dropping the store never leaks entries into
//! a stale task. Dismissal, bulk clear and expiry all go through the same
//! idempotent removal: whichever comes second finds nothing to do.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use metroconsole_core::NotificationId;

use crate::expiry::ExpiryPolicy;
use crate::notification::{Notification, NotificationInput};

/// The feed as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Newest first.
    pub entries: Vec<Notification>,
    pub unread: usize,
}

#[derive(Debug, Default)]
struct Feed {
    /// Newest first.
    entries: VecDeque<Notification>,
    timers: HashMap<NotificationId, AbortHandle>,
}

impl Feed {
    fn unread(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            entries: self.entries.iter().cloned().collect(),
            unread: self.unread(),
        }
    }

    fn position(&self, id: NotificationId) -> Option<usize> {
        self.entries.iter().position(|n| n.id == id)
    }
}

#[derive(Debug)]
struct Shared {
    feed: Mutex<Feed>,
    snapshots: watch::Sender<FeedSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, feed: &Feed) {
        self.snapshots.send_replace(feed.snapshot());
    }

    /// Remove `id` and cancel its timer. Returns `false` if it was already gone.
    fn remove(&self, id: NotificationId) -> bool {
        let mut feed = self.lock();
        if let Some(timer) = feed.timers.remove(&id) {
            timer.abort();
        }
        let Some(index) = feed.position(id) else {
            return false;
        };
        feed.entries.remove(index);
        self.publish(&feed);
        true
    }
}

/// Newest-first feed of notifications with per-severity expiry.
///
/// Operations never fail. Expiry needs a tokio runtime; a notification
/// pushed outside one stays until dismissed.
#[derive(Debug)]
pub struct NotificationStore {
    shared: Arc<Shared>,
    policy: ExpiryPolicy,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(ExpiryPolicy::default())
    }
}

impl NotificationStore {
    pub fn new(policy: ExpiryPolicy) -> Self {
        let (snapshots, _) = watch::channel(FeedSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                feed: Mutex::new(Feed::default()),
                snapshots,
            }),
            policy,
        }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// Add a notification at the front of the feed and schedule its expiry.
    pub fn push(&self, input: NotificationInput) -> NotificationId {
        let notification = input.into_notification(Utc::now());
        let id = notification.id;
        let severity = notification.severity;

        let mut feed = self.shared.lock();
        feed.entries.push_front(notification);

        if let Some(delay) = self.policy.delay_for(severity) {
            match Handle::try_current() {
                Ok(handle) => {
                    let shared: Weak<Shared> = Arc::downgrade(&self.shared);
                    let task = handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(shared) = shared.upgrade() {
                            if shared.remove(id) {
                                debug!(%id, "notification expired");
                            }
                        }
                    });
                    feed.timers.insert(id, task.abort_handle());
                    debug!(%id, %severity, delay_ms = delay.as_millis() as u64, "expiry scheduled");
                }
                Err(_) => {
                    warn!(%id, %severity, "no async runtime; notification will not expire");
                }
            }
        }

        self.shared.publish(&feed);
        id
    }

    /// Remove `id` now and cancel its pending expiry.
    ///
    /// Returns `false` if it was already gone (dismissed, cleared or expired).
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let removed = self.shared.remove(id);
        if !removed {
            debug!(%id, "dismiss of absent notification ignored");
        }
        removed
    }

    /// Remove everything and cancel every pending expiry.
    pub fn clear_all(&self) {
        let mut feed = self.shared.lock();
        for (_, timer) in feed.timers.drain() {
            timer.abort();
        }
        feed.entries.clear();
        self.shared.publish(&feed);
    }

    pub fn unread_count(&self) -> usize {
        self.shared.lock().unread()
    }

    /// Returns `false` if `id` is not in the feed.
    pub fn mark_read(&self, id: NotificationId) -> bool {
        let mut feed = self.shared.lock();
        let Some(index) = feed.position(id) else {
            return false;
        };
        if !feed.entries[index].read {
            feed.entries[index].read = true;
            self.shared.publish(&feed);
        }
        true
    }

    /// Returns how many entries changed.
    pub fn mark_all_read(&self) -> usize {
        let mut feed = self.shared.lock();
        let mut changed = 0;
        for n in feed.entries.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        if changed > 0 {
            self.shared.publish(&feed);
        }
        changed
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        let feed = self.shared.lock();
        feed.position(id).map(|i| feed.entries[i].clone())
    }

    /// Newest first.
    pub fn entries(&self) -> Vec<Notification> {
        self.shared.lock().entries.iter().cloned().collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<Notification> {
        self.shared
            .lock()
            .entries
            .iter()
            .filter(|n| n.category.as_deref() == Some(category))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().entries.is_empty()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.shared.lock().snapshot()
    }

    /// Receive the feed after every change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.shared.snapshots.subscribe()
    }
}

impl Drop for NotificationStore {
    fn drop(&mut self) {
        let mut feed = self.shared.lock();
        for (_, timer) in feed.timers.drain() {
            timer.abort();
        }
    }
}
