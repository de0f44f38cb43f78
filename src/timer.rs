//! # Timer Registry
//!
//! Tracks the named periodic callbacks an activation has registered so they
//! can be listed, checked and unregistered by id. Timers are in-memory and
//! non-durable: the host discards them when the activation goes away, so the
//! registry dies with its activation too.

use crate::errors::ActivityError;
use crate::host::{TimerCallback, TimerHandle, TimerHost};
use std::time::Duration;
use tracing::debug;

struct TimerEntry {
    id: String,
    handle: Box<dyn TimerHandle>,
}

/// Named timer registrations for one activation, in insertion order.
///
/// A duplicate id while the first registration is still active is an error;
/// unregistering frees the id for re-registration. No internal locking: the
/// turn model guarantees one call at a time per activation.
#[derive(Default)]
pub struct TimerRegistry {
    entries: Vec<TimerEntry>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer on the host and track its handle under `id`.
    pub fn register(
        &mut self,
        host: &(impl TimerHost + ?Sized),
        id: &str,
        callback: TimerCallback,
        due: Duration,
        period: Duration,
    ) -> Result<(), ActivityError> {
        if self.contains(id) {
            return Err(ActivityError::DuplicateTimer(id.to_string()));
        }
        let handle = host.start_timer(id, callback, due, period)?;
        self.entries.push(TimerEntry {
            id: id.to_string(),
            handle,
        });
        debug!(timer = %id, ?due, ?period, "timer registered");
        Ok(())
    }

    /// Cancel the timer registered under `id` and drop its handle.
    pub fn unregister(&mut self, id: &str) -> Result<(), ActivityError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ActivityError::TimerNotFound(id.to_string()))?;
        let entry = self.entries.remove(position);
        entry.handle.cancel();
        debug!(timer = %id, "timer unregistered");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Snapshot of registered ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every handle without the cancel bookkeeping. This is the
    /// deactivation path: the host throws timers away without notice.
    pub fn discard_all(&mut self) {
        let discarded = self.entries.len();
        self.entries.clear();
        if discarded > 0 {
            debug!(count = discarded, "timers discarded on deactivation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct StubHost {
        started: AtomicUsize,
    }

    struct StubHandle {
        cancelled: Arc<AtomicBool>,
    }

    impl TimerHandle for StubHandle {
        fn cancel(self: Box<Self>) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    impl TimerHost for StubHost {
        fn start_timer(
            &self,
            _id: &str,
            _callback: TimerCallback,
            _due: Duration,
            _period: Duration,
        ) -> Result<Box<dyn TimerHandle>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubHandle {
                cancelled: Arc::new(AtomicBool::new(false)),
            }))
        }
    }

    fn noop_callback() -> TimerCallback {
        Box::new(|| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn test_register_then_lookup() {
        let host = StubHost::default();
        let mut registry = TimerRegistry::new();

        registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();

        assert!(registry.contains("t1"));
        assert_eq!(registry.ids(), vec!["t1".to_string()]);
        assert_eq!(host.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_id_is_an_error() {
        let host = StubHost::default();
        let mut registry = TimerRegistry::new();

        registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();
        let err = registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap_err();

        assert!(matches!(err, ActivityError::DuplicateTimer(id) if id == "t1"));
        // The second registration never reached the host
        assert_eq!(host.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_unknown_id_is_an_error() {
        let mut registry = TimerRegistry::new();
        let err = registry.unregister("missing").unwrap_err();
        assert!(matches!(err, ActivityError::TimerNotFound(id) if id == "missing"));
    }

    #[test]
    fn test_unregister_frees_the_id() {
        let host = StubHost::default();
        let mut registry = TimerRegistry::new();

        registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();
        registry.unregister("t1").unwrap();
        assert!(!registry.contains("t1"));

        registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();
        assert!(registry.contains("t1"));
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let host = StubHost::default();
        let mut registry = TimerRegistry::new();

        for id in ["c", "a", "b"] {
            registry
                .register(&host, id, noop_callback(), Duration::ZERO, Duration::from_secs(1))
                .unwrap();
        }
        assert_eq!(registry.ids(), vec!["c", "a", "b"]);

        registry.unregister("a").unwrap();
        assert_eq!(registry.ids(), vec!["c", "b"]);
    }

    #[test]
    fn test_discard_all() {
        let host = StubHost::default();
        let mut registry = TimerRegistry::new();

        registry
            .register(&host, "t1", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();
        registry
            .register(&host, "t2", noop_callback(), Duration::ZERO, Duration::from_secs(1))
            .unwrap();

        registry.discard_all();
        assert!(registry.is_empty());
    }
}
