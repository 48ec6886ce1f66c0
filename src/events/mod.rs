//! Registry events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the registry, the discharge
//! dispatcher and the timer loops.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - [`Subscribe`], [`spawn_listener`] extension point for event consumers
//!
//! ## Quick reference
//! - **Publishers**: [`Janitor`](crate::Janitor) (registration and sweep
//!   diagnostics), the discharge dispatcher (failures), timer loops
//!   (callback failures).
//! - **Consumers**: listener workers spawned via [`spawn_listener`], or any
//!   receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub use subscriber::{spawn_listener, Subscribe};

#[cfg(feature = "logging")]
pub use log::LogWriter;
