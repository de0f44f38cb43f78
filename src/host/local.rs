//! A tokio-backed host used by integration tests and demos.
//!
//! `LocalHost` is the reference implementation of the host contract: timers
//! are spawned tasks that honor the non-overlapping tick rule, reminders live
//! in a shared [`ReminderStore`] standing in for the host's durable store, and
//! the deactivation controls keep queryable local state. It is not a full
//! actor runtime; activation scheduling and message dispatch stay out of
//! scope.

use super::{BoxFuture, HostRuntime, LifecycleHost, ReminderHost, TimerCallback, TimerHandle, TimerHost};
use crate::id::ActivityKey;
use anyhow::Result;
use chrono::TimeDelta;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

/// One durable reminder record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRecord {
    pub id: String,
    pub due: Duration,
    pub period: Duration,
}

/// The durable store shared by every activation of one logical identity.
///
/// Hand the same store to a second `LocalHost` to simulate re-activation:
/// reminders registered by the prior activation stay discoverable.
pub type ReminderStore = Arc<Mutex<Vec<ReminderRecord>>>;

#[derive(Debug, Default)]
struct Lifecycle {
    deactivation_requested: bool,
    keep_alive_until: Option<Instant>,
}

pub struct LocalHost<K: ActivityKey> {
    key: K,
    reminders: ReminderStore,
    lifecycle: Mutex<Lifecycle>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<K: ActivityKey> LocalHost<K> {
    /// Create a host with a fresh durable store
    pub fn new(key: K) -> Self {
        Self::with_store(key, Arc::new(Mutex::new(Vec::new())))
    }

    /// Create a host over an existing durable store (a re-activation of the
    /// same logical identity)
    pub fn with_store(key: K, store: ReminderStore) -> Self {
        Self {
            key,
            reminders: store,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn reminder_store(&self) -> ReminderStore {
        self.reminders.clone()
    }

    /// Whether `deactivate_on_idle` was called during this activation
    pub fn is_deactivation_requested(&self) -> bool {
        lock(&self.lifecycle).deactivation_requested
    }

    /// The instant before which the activation must be kept alive, if a
    /// positive delay is pending
    pub fn keep_alive_until(&self) -> Option<Instant> {
        lock(&self.lifecycle).keep_alive_until
    }
}

struct LocalTimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle for LocalTimerHandle {
    fn cancel(self: Box<Self>) {
        self.task.abort();
    }
}

impl Drop for LocalTimerHandle {
    fn drop(&mut self) {
        // Discard-on-deactivation path: the timer dies with its handle
        self.task.abort();
    }
}

impl<K: ActivityKey> TimerHost for LocalHost<K> {
    fn start_timer(
        &self,
        id: &str,
        mut callback: TimerCallback,
        due: Duration,
        period: Duration,
    ) -> Result<Box<dyn TimerHandle>> {
        let timer_id = id.to_string();
        let task = tokio::spawn(async move {
            sleep(due).await;
            loop {
                // Awaiting the tick before sleeping again is what keeps ticks
                // of one timer from interleaving.
                if let Err(e) = callback().await {
                    warn!(timer = %timer_id, "timer tick failed: {:#}", e);
                }
                sleep(period).await;
            }
        });
        Ok(Box::new(LocalTimerHandle { task }))
    }
}

impl<K: ActivityKey> ReminderHost for LocalHost<K> {
    fn put_reminder(&self, id: &str, due: Duration, period: Duration) -> BoxFuture<Result<()>> {
        let store = self.reminders.clone();
        let id = id.to_string();
        Box::pin(async move {
            let mut records = lock(&store);
            match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.due = due;
                    record.period = period;
                }
                None => records.push(ReminderRecord { id, due, period }),
            }
            Ok(())
        })
    }

    fn remove_reminder(&self, id: &str) -> BoxFuture<Result<()>> {
        let store = self.reminders.clone();
        let id = id.to_string();
        Box::pin(async move {
            lock(&store).retain(|r| r.id != id);
            Ok(())
        })
    }

    fn reminder_exists(&self, id: &str) -> BoxFuture<Result<bool>> {
        let store = self.reminders.clone();
        let id = id.to_string();
        Box::pin(async move { Ok(lock(&store).iter().any(|r| r.id == id)) })
    }

    fn list_reminders(&self) -> BoxFuture<Result<Vec<String>>> {
        let store = self.reminders.clone();
        Box::pin(async move { Ok(lock(&store).iter().map(|r| r.id.clone()).collect()) })
    }
}

impl<K: ActivityKey> LifecycleHost for LocalHost<K> {
    fn deactivate_on_idle(&self) {
        let mut lifecycle = lock(&self.lifecycle);
        lifecycle.deactivation_requested = true;
        // Overrides any pending keep-alive
        lifecycle.keep_alive_until = None;
        debug!(activity = %self.key, "deactivation requested");
    }

    fn delay_deactivation(&self, period: TimeDelta) {
        let mut lifecycle = lock(&self.lifecycle);
        if period < TimeDelta::zero() {
            lifecycle.keep_alive_until = None;
            debug!(activity = %self.key, "deactivation delay cleared");
            return;
        }
        let candidate = Instant::now() + period.to_std().unwrap_or_default();
        // Extend-only: a later call never moves the deadline earlier
        lifecycle.keep_alive_until = Some(match lifecycle.keep_alive_until {
            Some(current) if current > candidate => current,
            _ => candidate,
        });
        debug!(activity = %self.key, delay = %period, "deactivation delayed");
    }
}

impl<K: ActivityKey> HostRuntime<K> for LocalHost<K> {
    fn identity(&self) -> Option<K> {
        Some(self.key.clone())
    }
}
