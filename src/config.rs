//! # Registry configuration.
//!
//! [`Config`] controls per-registry behavior: whether lifecycle diagnostics
//! are published and how large the event bus channel is. Debug output is an
//! explicit per-registry flag rather than a process-wide toggle, so two
//! registries in one process can be configured independently.
//!
//! # Example
//! ```
//! use janitor::{Config, Janitor};
//!
//! let mut cfg = Config::default();
//! cfg.debug = true;
//! cfg.bus_capacity = 256;
//!
//! let registry = Janitor::with_config(cfg);
//! assert!(registry.is_empty());
//! ```

/// Per-registry configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Publish lifecycle diagnostics (`ObligationAdded`, `SweepStarted`, ...).
    ///
    /// Failure events are always published regardless of this flag.
    pub debug: bool,
    /// Capacity of the event bus channel (clamped to a minimum of 1).
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `debug = false`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            debug: false,
            bus_capacity: 1024,
        }
    }
}
