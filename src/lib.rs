//! # Cadence
//!
//! Cadence is a runtime-abstraction and lifecycle-tracking layer that sits
//! between business-logic activities and a host actor-runtime. An activity is
//! a single-threaded, identity-addressed unit of computation the host
//! activates, deactivates and re-activates transparently; this layer gives it
//! a uniform surface over the host's capabilities and keeps track of
//! everything it registers.
//!
//! ## Core Features
//!
//! * **Named timers**: periodic in-memory callbacks with non-overlapping
//!   ticks, tracked by id and discarded on deactivation
//! * **Durable reminders**: host-persisted periodic notifications that
//!   survive deactivation, with overwrite-on-reregister semantics
//! * **Observers**: multicast pub/sub keyed by event type, fire-and-forget
//!   delivery with per-observer failure isolation
//! * **Deactivation control**: end-of-turn deactivation requests and signed
//!   keep-alive delays
//! * **Recording double**: a drop-in in-memory host that records every
//!   mutating call to an ordered invocation log for deterministic unit tests
//!
//! ## Architecture
//!
//! Activity code talks only to [`ActivityContext`], which owns the
//! per-activation registries and forwards host effects through the
//! [`HostRuntime`] trait injected once at construction. `HostRuntime` is the
//! whole mode switch: a live adapter delegates to the real host,
//! [`RecordingRuntime`] records instead of performing, and [`LocalHost`] is a
//! tokio-backed reference host for integration tests.
//!
//! Identity is generic: [`ActivityId`] is parameterized by an
//! [`ActivityKey`], implemented for `i64`, `uuid::Uuid` and `String`.

pub mod config;
pub mod context;
pub mod deactivation;
pub mod errors;
pub mod host;
pub mod id;
pub mod logging;
pub mod observer;
pub mod recording;
pub mod reminder;
pub mod timer;

pub use config::LoggingConfig;
pub use context::ActivityContext;
pub use deactivation::DeactivationController;
pub use errors::ActivityError;
pub use host::local::{LocalHost, ReminderRecord, ReminderStore};
pub use host::{
    BoxFuture, HostRuntime, LifecycleHost, ReminderHost, TimerCallback, TimerHandle, TimerHost,
};
pub use id::{ActivityId, ActivityKey};
pub use observer::{Observer, ObserverCollection};
pub use recording::{Invocation, RecordingRuntime};
pub use reminder::ReminderRegistry;
pub use timer::TimerRegistry;
