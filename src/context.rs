//! # Activity Context
//!
//! The single surface an activity's business logic talks to. The context owns
//! the per-activation registries and forwards host effects through the
//! [`HostRuntime`] injected at construction; swapping a live host adapter for
//! the [`RecordingRuntime`] changes nothing at the call sites.
//!
//! Methods take `&mut self` because an activation executes one turn at a
//! time; the registries deliberately have no internal locking.

use crate::deactivation::DeactivationController;
use crate::errors::ActivityError;
use crate::host::{BoxFuture, HostRuntime, TimerCallback};
use crate::id::{ActivityId, ActivityKey};
use crate::observer::{Observer, ObserverCollection};
use crate::recording::RecordingRuntime;
use crate::reminder::ReminderRegistry;
use crate::timer::TimerRegistry;
use chrono::TimeDelta;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Runtime context for one activation of one activity.
pub struct ActivityContext<K: ActivityKey> {
    host: Arc<dyn HostRuntime<K>>,
    identity: Option<ActivityId<K>>,
    timers: TimerRegistry,
    reminders: ReminderRegistry,
    observers: ObserverCollection<K>,
    deactivation: DeactivationController,
}

impl<K: ActivityKey> ActivityContext<K> {
    /// Build a context over the given host. This is the mode switch: pass a
    /// live adapter in production, a recording double in tests.
    pub fn new(host: Arc<dyn HostRuntime<K>>) -> Self {
        Self {
            host,
            identity: None,
            timers: TimerRegistry::new(),
            reminders: ReminderRegistry::new(),
            observers: ObserverCollection::new(),
            deactivation: DeactivationController::new(),
        }
    }

    /// Build a context over a fresh recording double, returning the double so
    /// the harness can inject identity/state and read the invocation log.
    pub fn recording() -> (Self, Arc<RecordingRuntime<K>>) {
        let runtime = Arc::new(RecordingRuntime::new());
        (Self::new(runtime.clone()), runtime)
    }

    /// The activity's own identity, resolved from the host on first use and
    /// cached for the activation's lifetime.
    ///
    /// With a recording double, resolving before `set_identity` is a harness
    /// setup bug and fails with [`ActivityError::Setup`].
    pub fn id(&mut self) -> Result<ActivityId<K>, ActivityError> {
        if let Some(id) = &self.identity {
            return Ok(id.clone());
        }
        let key = self.host.identity().ok_or(ActivityError::Setup(
            "activity identity was never injected; call set_identity on the recording runtime before first use",
        ))?;
        let id = ActivityId::new(key);
        self.identity = Some(id.clone());
        Ok(id)
    }

    // --- Timers ---

    /// Register a named periodic callback.
    ///
    /// The callback receives a clone of `state` each tick. Ticks for one
    /// timer never interleave: the host schedules the next tick only after
    /// the previous tick's future resolves. A failed tick is logged by the
    /// host and does not cancel the timer. The timer does not keep the
    /// activation alive and is discarded on deactivation.
    ///
    /// Registering an id that is still active fails with
    /// [`ActivityError::DuplicateTimer`].
    pub fn register_timer<T, F, Fut>(
        &mut self,
        id: &str,
        mut callback: F,
        state: T,
        due: Duration,
        period: Duration,
    ) -> Result<(), ActivityError>
    where
        T: Clone + Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let erased: TimerCallback = Box::new(move || {
            let tick: BoxFuture<anyhow::Result<()>> = Box::pin(callback(state.clone()));
            tick
        });
        self.timers.register(&*self.host, id, erased, due, period)
    }

    /// Cancel and forget the timer registered under `id`. An unknown id
    /// fails with [`ActivityError::TimerNotFound`].
    pub fn unregister_timer(&mut self, id: &str) -> Result<(), ActivityError> {
        self.timers.unregister(id)
    }

    /// Whether a timer with the given id is currently registered
    pub fn is_timer_registered(&self, id: &str) -> bool {
        self.timers.contains(id)
    }

    /// Ids of all currently registered timers, in registration order
    pub fn registered_timers(&self) -> Vec<String> {
        self.timers.ids()
    }

    /// Drop all timer registrations without notice, the way the host does
    /// when it deactivates the activity. Host adapters call this from their
    /// deactivation path.
    pub fn discard_timers(&mut self) {
        self.timers.discard_all();
    }

    // --- Reminders ---

    /// Register a durable reminder, overwriting any existing reminder under
    /// the same id. Awaits the host's durable write.
    pub async fn register_reminder(
        &mut self,
        id: &str,
        due: Duration,
        period: Duration,
    ) -> Result<(), ActivityError> {
        self.reminders.register(&*self.host, id, due, period).await
    }

    /// Unregister the reminder under `id` if one exists; an id with no
    /// durable record is a silent no-op.
    pub async fn unregister_reminder(&mut self, id: &str) -> Result<(), ActivityError> {
        self.reminders.unregister(&*self.host, id).await
    }

    /// Whether a reminder with the given id exists for this logical identity,
    /// including reminders registered by a prior activation.
    pub async fn is_reminder_registered(&self, id: &str) -> Result<bool, ActivityError> {
        self.reminders.is_registered(&*self.host, id).await
    }

    /// Ids of all reminders bound to this logical identity, per the host's
    /// authoritative store.
    pub async fn registered_reminders(&self) -> Result<Vec<String>, ActivityError> {
        self.reminders.registered(&*self.host).await
    }

    // --- Observers ---

    /// Attach an observer for events of type `E`; idempotent.
    pub fn attach<E: Any>(&mut self, observer: Arc<dyn Observer<K, E>>) {
        self.observers.attach(observer);
    }

    /// Detach an observer from events of type `E`; absent pairs are a no-op.
    pub fn detach<E: Any>(&mut self, observer: &Arc<dyn Observer<K, E>>) {
        self.observers.detach(observer);
    }

    /// Fan `event` out to every observer attached for its exact type,
    /// fire-and-forget, alongside this activity's identity. Observer failures
    /// are contained and never fail this call.
    pub fn notify<E: Any>(&mut self, event: &E) -> Result<(), ActivityError> {
        let id = self.id()?;
        self.observers.notify(&id, event);
        Ok(())
    }

    /// How many observers are attached for events of type `E`
    pub fn attached_observers<E: Any>(&self) -> usize {
        self.observers.attached_count::<E>()
    }

    // --- Deactivation ---

    /// Mark this activation for deactivation once the in-flight method call
    /// returns; overrides any pending keep-alive delay.
    pub fn deactivate_on_idle(&mut self) {
        self.deactivation.deactivate_on_idle(&*self.host);
    }

    /// Positive: keep this activation alive for at least `period` from now
    /// (never moving an existing keep-alive deadline earlier). Negative:
    /// clear any pending keep-alive.
    pub fn delay_deactivation(&mut self, period: TimeDelta) {
        self.deactivation.delay_deactivation(&*self.host, period);
    }

    /// Whether this activation asked to be deactivated
    pub fn is_deactivation_requested(&self) -> bool {
        self.deactivation.is_deactivation_requested()
    }

    // --- Retired API shapes ---
    //
    // The unparameterized timer/reminder shapes of the underlying host are
    // retired: they bypass the registries, so nothing would track what got
    // registered. Each shim fails immediately with a message naming the
    // replacement.

    #[deprecated(note = "use register_timer, which takes a timer id and tracks the registration")]
    pub fn register_timer_unnamed<T, F, Fut>(
        &mut self,
        _callback: F,
        _state: T,
        _due: Duration,
        _period: Duration,
    ) -> Result<(), ActivityError>
    where
        T: Clone + Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Err(ActivityError::Misuse(
            "use the register_timer overload that takes a timer id and automatically tracks the registration",
        ))
    }

    #[deprecated(note = "use register_reminder, which tracks the registration by id")]
    pub fn register_or_update_reminder(
        &mut self,
        _id: &str,
        _due: Duration,
        _period: Duration,
    ) -> Result<(), ActivityError> {
        Err(ActivityError::Misuse(
            "use register_reminder, which automatically tracks all registered reminders",
        ))
    }

    #[deprecated(note = "use unregister_reminder, which takes a reminder id")]
    pub fn unregister_reminder_handle<H>(&mut self, _handle: H) -> Result<(), ActivityError> {
        Err(ActivityError::Misuse(
            "use the unregister_reminder overload that takes a reminder id",
        ))
    }

    #[deprecated(note = "use is_reminder_registered together with unregister_reminder")]
    pub fn get_reminder(&mut self, _id: &str) -> Result<(), ActivityError> {
        Err(ActivityError::Misuse(
            "use is_reminder_registered together with unregister_reminder instead of fetching reminder handles",
        ))
    }

    #[deprecated(note = "use registered_reminders")]
    pub fn get_reminders(&mut self) -> Result<Vec<String>, ActivityError> {
        Err(ActivityError::Misuse(
            "use registered_reminders to get the ids of all currently registered reminders",
        ))
    }
}
