//! # Registry events emitted by the registry, dispatcher and timers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle diagnostics**: registration flow (added, replaced, removed)
//!   and sweep progress (started, finished). Published only when the owning
//!   registry's [`Config::debug`](crate::Config) flag is set.
//! - **Failure reports**: a discharge or timer callback failed. Always
//!   published; this is how errors raised during cleanup are surfaced
//!   without aborting the sweep they occurred in.
//! - **Advisories**: suspicious but non-fatal registrations.
//!
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; use it to restore order when events are consumed from
//! multiple receivers.
//!
//! ## Example
//! ```rust
//! use janitor::{Event, EventKind, Key};
//!
//! let ev = Event::now(EventKind::DischargeFailed)
//!     .with_key(&Key::Seq(4))
//!     .with_error("cleanup failed: socket already closed");
//!
//! assert_eq!(ev.kind, EventKind::DischargeFailed);
//! assert_eq!(ev.key, Some(Key::Seq(4)));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::registry::Key;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of registry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle diagnostics (debug-gated) ===
    /// A new obligation was stored.
    ///
    /// Sets: `key`, `label` (if any), `at`, `seq`.
    ObligationAdded,

    /// An existing entry was overwritten; the prior obligation is being
    /// discharged.
    ///
    /// Sets: `key`, `at`, `seq`.
    ObligationReplaced,

    /// An entry was removed from the registry.
    ///
    /// Sets: `key`, `at`, `seq`.
    ObligationRemoved,

    /// A sweep (`clean`/`destroy`) began.
    ///
    /// Sets: `at`, `seq`.
    SweepStarted,

    /// A sweep finished and the registry is empty.
    ///
    /// Sets: `count` (obligations discharged), `at`, `seq`.
    SweepFinished,

    // === Failure reports (always published) ===
    /// Discharging one obligation failed or panicked; the sweep continued.
    ///
    /// Sets: `key` (when known), `error`, `at`, `seq`.
    DischargeFailed,

    /// An interval callback failed or panicked; the timer loop stopped.
    ///
    /// Sets: `error`, `at`, `seq`.
    TimerFailed,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `label` (subscriber name), `error`, `at`, `seq`.
    SubscriberPanicked,

    // === Advisories (always published) ===
    /// An activity whose token was already cancelled was registered; its
    /// discharge will be a no-op.
    ///
    /// Sets: `at`, `seq`.
    StaleActivity,
}

/// Registry event payload.
///
/// Only the fields relevant to a given [`EventKind`] are populated; the rest
/// stay `None`.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event classification.
    pub kind: EventKind,
    /// Wall-clock timestamp taken at creation.
    pub at: SystemTime,
    /// Globally monotonic sequence number.
    pub seq: u64,
    /// Key of the entry the event refers to.
    pub key: Option<Key>,
    /// Human-readable label (entry label or subscriber name).
    pub label: Option<String>,
    /// Error message for failure reports.
    pub error: Option<String>,
    /// Obligation count for sweep summaries.
    pub count: Option<usize>,
}

impl Event {
    /// Creates an event stamped with the current time and the next sequence
    /// number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            at: SystemTime::now(),
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            key: None,
            label: None,
            error: None,
            count: None,
        }
    }

    /// Attaches the key of the entry the event refers to.
    pub fn with_key(mut self, key: &Key) -> Self {
        self.key = Some(key.clone());
        self
    }

    /// Attaches a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches an obligation count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
