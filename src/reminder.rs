//! # Reminder Registry
//!
//! Tracks durable reminders. Unlike timers, reminders are persisted by the
//! host and addressed by the activity's logical identity, so any activation of
//! that identity can discover reminders it did not itself register. The
//! in-memory map here is only a cache; the host is authoritative for
//! existence checks and enumeration.

use crate::errors::ActivityError;
use crate::host::ReminderHost;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedReminder {
    id: String,
    due: Duration,
    period: Duration,
}

/// Local cache over the host's durable reminder store.
///
/// Re-registering an existing id is always an overwrite of both the cache
/// entry and the durable record, never an error. Unregistering is tolerant:
/// an id with no durable record is a silent no-op.
#[derive(Default)]
pub struct ReminderRegistry {
    cache: Vec<CachedReminder>,
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the reminder under `id`, awaiting the host's
    /// durable write before updating the cache.
    pub async fn register(
        &mut self,
        host: &(impl ReminderHost + ?Sized),
        id: &str,
        due: Duration,
        period: Duration,
    ) -> Result<(), ActivityError> {
        host.put_reminder(id, due, period).await?;
        match self.cache.iter_mut().find(|r| r.id == id) {
            Some(cached) => {
                cached.due = due;
                cached.period = period;
            }
            None => self.cache.push(CachedReminder {
                id: id.to_string(),
                due,
                period,
            }),
        }
        debug!(reminder = %id, ?due, ?period, "reminder registered");
        Ok(())
    }

    /// Drop the cache entry unconditionally, then remove the durable record
    /// if the host has one.
    pub async fn unregister(
        &mut self,
        host: &(impl ReminderHost + ?Sized),
        id: &str,
    ) -> Result<(), ActivityError> {
        self.cache.retain(|r| r.id != id);
        host.remove_reminder(id).await?;
        debug!(reminder = %id, "reminder unregistered");
        Ok(())
    }

    /// True on a cache hit, otherwise whatever the host knows. The fallback is
    /// what lets an activation see reminders registered before it existed.
    pub async fn is_registered(
        &self,
        host: &(impl ReminderHost + ?Sized),
        id: &str,
    ) -> Result<bool, ActivityError> {
        if self.cache.iter().any(|r| r.id == id) {
            return Ok(true);
        }
        Ok(host.reminder_exists(id).await?)
    }

    /// The host's authoritative list of reminder ids for this identity.
    pub async fn registered(
        &self,
        host: &(impl ReminderHost + ?Sized),
    ) -> Result<Vec<String>, ActivityError> {
        Ok(host.list_reminders().await?)
    }

    /// Ids currently present in the local cache, in insertion order
    pub fn cached_ids(&self) -> Vec<String> {
        self.cache.iter().map(|r| r.id.clone()).collect()
    }

    /// The cached due/period for `id`, if this activation registered it
    pub fn cached(&self, id: &str) -> Option<(Duration, Duration)> {
        self.cache
            .iter()
            .find(|r| r.id == id)
            .map(|r| (r.due, r.period))
    }
}
