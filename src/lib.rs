//! # janitor
//!
//! **Janitor** is a keyed cleanup-obligation registry for async Rust.
//!
//! It tracks heterogeneous cleanup work (callbacks, disposable resources,
//! subscription handles, cancellable background activities, nested registries)
//! under caller-chosen keys and guarantees each obligation is discharged
//! exactly once: either when its key is overwritten, or when the registry is
//! swept as a whole.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller                         ┌──────────────────────────────────────┐
//!     │  add / set / remove        │  Janitor (keyed registry)            │
//!     ├───────────────────────────►│  - entries: Key → Obligation         │
//!     │                            │  - labels:  seq → String             │
//!     │  interval / delayed /      │  - Bus (broadcast events)            │
//!     │  adopt                     │  - Config (debug, bus capacity)      │
//!     ├───────────────────────────►└──────┬───────────────────┬───────────┘
//!     │                                   │ overwrite /       │ clean()
//!     │                                   │ remove            │
//!     │                                   ▼                   ▼
//!     │                            ┌──────────────────────────────────────┐
//!     │                            │  discharge dispatcher (one-shot)     │
//!     │                            │  Subscription → unsubscribe          │
//!     │                            │  Action       → invoke               │
//!     │                            │  Disposable   → dispose              │
//!     │                            │  Registry     → clean (recursive)    │
//!     │                            │  Activity     → cancel (request)     │
//!     │                            └──────────────┬───────────────────────┘
//!     │                                           │ failures
//!     │                                           ▼
//!     │                            ┌──────────────────────────────────────┐
//!     └── events() ◄───────────────┤  Bus (tokio broadcast)               │
//!                                  └──────────────────────────────────────┘
//! ```
//!
//! ### Sweep lifecycle
//! ```text
//! clean() / destroy()
//!   ├─► phase 1: extract every Subscription entry, discharge it
//!   │            (event feeds are silenced before any other side effect)
//!   └─► phase 2: repeatedly extract *any* remaining entry, discharge it
//!                ├─ removal happens before discharge, so an obligation may
//!                │  register new entries mid-sweep and they are still found
//!                └─ loop ends when the map is observed empty
//! ```
//!
//! ## Concerns
//! | Concern | Purpose | Entry point |
//! |---|---|---|
//! | **Registry** | Track obligations by key, replace-disposes-old. | [`Janitor`] |
//! | **Obligations** | Closed set of cleanup shapes and their discharge. | [`Obligation`] |
//! | **Timers** | Cancellable repeating/deferred activities. | [`Janitor::interval`], [`Janitor::delayed`] |
//! | **Future adapter** | Track a pending task until it settles. | [`Janitor::adopt`] |
//! | **Reporting** | Broadcast registry events to subscribers. | [`Bus`], [`Subscribe`] |
//! | **Configuration** | Debug diagnostics, bus capacity. | [`Config`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use janitor::{Janitor, Obligation};
//!
//! let registry = Janitor::new();
//!
//! // Anonymous obligation under a generated sequence key.
//! let key = registry
//!     .add_labeled(Obligation::action(|| println!("cache flushed")), "cache")
//!     .unwrap();
//!
//! // Caller-chosen key; overwriting it later discharges the old value.
//! registry
//!     .set("feed", Obligation::subscription_fn(|| println!("unsubscribed")))
//!     .unwrap();
//!
//! assert_eq!(registry.len(), 2);
//! assert_eq!(registry.labels().len(), 1);
//!
//! // Subscriptions are silenced first, then everything else drains.
//! registry.clean();
//! assert!(registry.is_empty());
//! # let _ = key;
//! ```

mod config;
mod error;
mod events;
mod obligation;
mod registry;
mod timer;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{DischargeError, RegistryError};
pub use events::{spawn_listener, Bus, Event, EventKind, Subscribe};
pub use obligation::{ActionFn, Dispose, Obligation, Unsubscribe};
pub use registry::{Janitor, Key, RESERVED_KEYS};
pub use timer::ActivityHandle;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use events::LogWriter;
