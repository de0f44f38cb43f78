//! # Deactivation Controller
//!
//! Forwards end-of-turn deactivation requests and keep-alive delays to the
//! host and remembers whether this activation asked to be deactivated.

use crate::host::LifecycleHost;
use chrono::TimeDelta;
use tracing::debug;

/// Deactivation requests for the current activation.
///
/// The controller has no immediate effect on the in-flight call: the host
/// acts once the turn completes.
#[derive(Debug, Default)]
pub struct DeactivationController {
    requested: bool,
}

impl DeactivationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the activation for deactivation once the in-flight method call
    /// returns. Idempotent; overrides any pending keep-alive delay.
    pub fn deactivate_on_idle(&mut self, host: &(impl LifecycleHost + ?Sized)) {
        host.deactivate_on_idle();
        if !self.requested {
            self.requested = true;
            debug!("activation marked for deactivation on idle");
        }
    }

    /// Positive `period`: keep the activation alive for at least that long
    /// from now (extend-only). Negative: clear any pending keep-alive.
    pub fn delay_deactivation(&mut self, host: &(impl LifecycleHost + ?Sized), period: TimeDelta) {
        host.delay_deactivation(period);
    }

    /// Whether `deactivate_on_idle` was called during this activation
    pub fn is_deactivation_requested(&self) -> bool {
        self.requested
    }
}
