use thiserror::Error;

/// # Activity Error
///
/// Represents the error conditions surfaced by the runtime-abstraction layer.
/// Registry misuse fails fast with a specific kind; failures from the host
/// itself pass through unchanged so the caller sees exactly what the host
/// reported.
#[derive(Error, Debug)]
pub enum ActivityError {
    /// A timer with this id is already registered and active
    #[error("timer already registered: {0}")]
    DuplicateTimer(String),

    /// No timer with this id is currently registered
    #[error("timer not found: {0}")]
    TimerNotFound(String),

    /// A deliberately retired legacy API shape was invoked
    #[error("{0}")]
    Misuse(&'static str),

    /// The recording double was used before identity or state injection
    #[error("test double setup error: {0}")]
    Setup(&'static str),

    /// A host-level failure, propagated unchanged; retry policy is the
    /// host's responsibility
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl ActivityError {
    /// Whether this error is fatal misuse of the API rather than a host fault
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Misuse(_))
    }
}
