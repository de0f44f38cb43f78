//! # Host Runtime Boundary
//!
//! The seam between the abstraction layer and whatever actually activates and
//! deactivates activities. Everything the layer consumes from the host is
//! expressed as an object-safe trait here: a timer primitive, a durable
//! reminder store, and the deactivation controls, plus the identity accessor
//! on the combined [`HostRuntime`] trait.
//!
//! The mode switch of the layer is which implementation gets injected at
//! construction: a live adapter delegating to a real host, the in-memory
//! [`RecordingRuntime`](crate::recording::RecordingRuntime) used by test
//! harnesses, or the tokio-backed [`LocalHost`](local::LocalHost).

use crate::id::ActivityKey;
use anyhow::Result;
use chrono::TimeDelta;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub mod local;

/// Boxed future returned by suspending host operations
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Type-erased periodic callback handed to the host's timer primitive.
///
/// Each tick the host calls this once and must await the returned future to
/// completion before scheduling the next tick.
pub type TimerCallback = Box<dyn FnMut() -> BoxFuture<Result<()>> + Send>;

/// Opaque disposable handle to a live host timer.
///
/// Dropping the handle without calling [`cancel`](TimerHandle::cancel) is the
/// deactivation path: the timer is discarded without notice.
pub trait TimerHandle: Send {
    fn cancel(self: Box<Self>);
}

/// The host's in-memory timer primitive.
///
/// Adapters must preserve the host tick contract: ticks for one timer never
/// interleave (the next tick is scheduled only after the previous callback's
/// future resolves), a failed tick is logged and does not cancel the timer,
/// and a timer does not keep its activation alive.
pub trait TimerHost: Send + Sync {
    fn start_timer(
        &self,
        id: &str,
        callback: TimerCallback,
        due: Duration,
        period: Duration,
    ) -> Result<Box<dyn TimerHandle>>;
}

/// The host's durable reminder store, addressed by the activity's logical
/// identity. All operations may suspend on host I/O.
pub trait ReminderHost: Send + Sync {
    /// Create or overwrite the durable record under `id`
    fn put_reminder(&self, id: &str, due: Duration, period: Duration) -> BoxFuture<Result<()>>;

    /// Remove the durable record under `id`; a missing record is a no-op
    fn remove_reminder(&self, id: &str) -> BoxFuture<Result<()>>;

    /// Whether a durable record exists under `id`, regardless of which
    /// activation registered it
    fn reminder_exists(&self, id: &str) -> BoxFuture<Result<bool>>;

    /// Authoritative enumeration of all records bound to this identity
    fn list_reminders(&self) -> BoxFuture<Result<Vec<String>>>;
}

/// The host's deactivation controls for the current activation.
pub trait LifecycleHost: Send + Sync {
    /// Mark the activation for deactivation once the in-flight call returns
    fn deactivate_on_idle(&self);

    /// Positive: keep the activation alive for at least `period` from now,
    /// never moving an existing keep-alive deadline earlier. Negative: clear
    /// any pending keep-alive.
    fn delay_deactivation(&self, period: TimeDelta);
}

/// Everything an activation consumes from its host, plus the identity
/// accessor. Selected once at construction of an
/// [`ActivityContext`](crate::context::ActivityContext).
pub trait HostRuntime<K: ActivityKey>: TimerHost + ReminderHost + LifecycleHost {
    /// The stable key of this activation's logical identity. `None` only for
    /// a test double that was never given one.
    fn identity(&self) -> Option<K>;
}
