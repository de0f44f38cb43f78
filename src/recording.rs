//! # Recording Double
//!
//! An in-memory [`HostRuntime`] that performs no host calls. Every mutating
//! operation is appended to an ordered, append-only [`Invocation`] log the
//! test harness can assert against, and the harness injects identity and
//! state explicitly. Activity code is unmodified between this double and a
//! live host: both satisfy the same trait contracts.

use crate::errors::ActivityError;
use crate::host::{
    BoxFuture, HostRuntime, LifecycleHost, ReminderHost, TimerCallback, TimerHandle, TimerHost,
};
use crate::id::ActivityKey;
use anyhow::Result;
use chrono::TimeDelta;
use futures::future;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One recorded mutating call, in the exact order activity code made it.
///
/// Read operations (lookups, enumerations) are not recorded; the log is a
/// trace of effects, not of queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invocation {
    RegisteredTimer {
        id: String,
        due: Duration,
        period: Duration,
    },
    UnregisteredTimer {
        id: String,
    },
    RegisteredReminder {
        id: String,
        due: Duration,
        period: Duration,
    },
    UnregisteredReminder {
        id: String,
    },
    RequestedDeactivation,
    RequestedDeactivationDelay {
        #[serde(with = "delay_serde")]
        period: TimeDelta,
    },
}

mod delay_serde {
    use chrono::TimeDelta;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(period: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(period.num_milliseconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(millis)
            .ok_or_else(|| D::Error::custom(format!("delay out of range: {} ms", millis)))
    }
}

struct RecordedReminder {
    id: String,
    due: Duration,
    period: Duration,
}

struct Inner<K> {
    identity: Option<K>,
    state: Option<Box<dyn Any + Send>>,
    log: Vec<Invocation>,
    /// Stand-in for the host's durable store; doubles as the authoritative
    /// list the context enumerates in test mode
    reminders: Vec<RecordedReminder>,
}

/// The in-memory substitute for a live host.
///
/// Owned by one test case for one activity; the log is never shared across
/// activities. Construct with
/// [`ActivityContext::recording`](crate::context::ActivityContext::recording)
/// or wrap one in an `Arc` yourself.
pub struct RecordingRuntime<K: ActivityKey> {
    inner: Arc<Mutex<Inner<K>>>,
}

fn lock<K>(mutex: &Mutex<Inner<K>>) -> MutexGuard<'_, Inner<K>> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<K: ActivityKey> Default for RecordingRuntime<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ActivityKey> RecordingRuntime<K> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                identity: None,
                state: None,
                log: Vec::new(),
                reminders: Vec::new(),
            })),
        }
    }

    /// Inject the identity the activity will see from `id()`. Must be called
    /// before the activity first resolves its identity.
    pub fn set_identity(&self, key: K) {
        lock(&self.inner).identity = Some(key);
    }

    /// Inject state for a stateful activity to pick up
    pub fn inject_state<S: Any + Send>(&self, state: S) {
        lock(&self.inner).state = Some(Box::new(state));
    }

    pub fn has_state(&self) -> bool {
        lock(&self.inner).state.is_some()
    }

    /// Take the injected state out of the double. Using the double before
    /// injection, or asking for the wrong type, is a harness setup bug.
    pub fn take_state<S: Any + Send>(&self) -> Result<S, ActivityError> {
        let mut inner = lock(&self.inner);
        let boxed = inner.state.take().ok_or(ActivityError::Setup(
            "no state was injected; call inject_state before the activity reads its state",
        ))?;
        match boxed.downcast::<S>() {
            Ok(state) => Ok(*state),
            Err(boxed) => {
                inner.state = Some(boxed);
                Err(ActivityError::Setup(
                    "injected state has a different type than the activity expects",
                ))
            }
        }
    }

    /// Snapshot of the invocation log, in exact call order
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.inner).log.clone()
    }

    fn record(&self, invocation: Invocation) {
        lock(&self.inner).log.push(invocation);
    }
}

struct RecordedTimerHandle<K: ActivityKey> {
    id: String,
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K: ActivityKey> TimerHandle for RecordedTimerHandle<K> {
    fn cancel(self: Box<Self>) {
        lock(&self.inner)
            .log
            .push(Invocation::UnregisteredTimer { id: self.id });
    }
}

impl<K: ActivityKey> TimerHost for RecordingRuntime<K> {
    fn start_timer(
        &self,
        id: &str,
        _callback: TimerCallback,
        due: Duration,
        period: Duration,
    ) -> Result<Box<dyn TimerHandle>> {
        self.record(Invocation::RegisteredTimer {
            id: id.to_string(),
            due,
            period,
        });
        Ok(Box::new(RecordedTimerHandle {
            id: id.to_string(),
            inner: self.inner.clone(),
        }))
    }
}

impl<K: ActivityKey> ReminderHost for RecordingRuntime<K> {
    // Mutations are recorded eagerly, before the returned future is awaited,
    // so the log keeps exact call order even if a caller holds futures.

    fn put_reminder(&self, id: &str, due: Duration, period: Duration) -> BoxFuture<Result<()>> {
        let mut inner = lock(&self.inner);
        match inner.reminders.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.due = due;
                record.period = period;
            }
            None => inner.reminders.push(RecordedReminder {
                id: id.to_string(),
                due,
                period,
            }),
        }
        inner.log.push(Invocation::RegisteredReminder {
            id: id.to_string(),
            due,
            period,
        });
        Box::pin(future::ready(Ok(())))
    }

    fn remove_reminder(&self, id: &str) -> BoxFuture<Result<()>> {
        let mut inner = lock(&self.inner);
        inner.reminders.retain(|r| r.id != id);
        inner.log.push(Invocation::UnregisteredReminder {
            id: id.to_string(),
        });
        Box::pin(future::ready(Ok(())))
    }

    fn reminder_exists(&self, id: &str) -> BoxFuture<Result<bool>> {
        let exists = lock(&self.inner).reminders.iter().any(|r| r.id == id);
        Box::pin(future::ready(Ok(exists)))
    }

    fn list_reminders(&self) -> BoxFuture<Result<Vec<String>>> {
        let ids = lock(&self.inner)
            .reminders
            .iter()
            .map(|r| r.id.clone())
            .collect();
        Box::pin(future::ready(Ok(ids)))
    }
}

impl<K: ActivityKey> LifecycleHost for RecordingRuntime<K> {
    fn deactivate_on_idle(&self) {
        self.record(Invocation::RequestedDeactivation);
    }

    fn delay_deactivation(&self, period: TimeDelta) {
        self.record(Invocation::RequestedDeactivationDelay { period });
    }
}

impl<K: ActivityKey> HostRuntime<K> for RecordingRuntime<K> {
    fn identity(&self) -> Option<K> {
        lock(&self.inner).identity.clone()
    }
}
