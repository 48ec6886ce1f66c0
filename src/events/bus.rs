//! Event bus for broadcasting registry events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets the
//! registry, the discharge dispatcher and the timer loops exchange
//! [`Event`]s with any number of consumers.
//!
//! - [`Bus::publish`] sends an event to all subscribers (non-blocking).
//! - [`Bus::subscribe`] creates a new receiver for consuming events.

use tokio::sync::broadcast;

use crate::events::Event;

/// Broadcast channel for registry events.
///
/// Wrapper over [`tokio::sync::broadcast`] that provides `publish`/`subscribe`
/// methods for working with [`Event`]s. Cloning a bus clones the sender side;
/// all clones feed the same set of receivers.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Errors are ignored if there are no active subscribers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Subscribes to the bus and returns a new receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
