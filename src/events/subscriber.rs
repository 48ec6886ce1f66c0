//! # Event subscriber trait and listener worker.
//!
//! [`Subscribe`] is the extension point for plugging custom event consumers
//! into a registry, and [`spawn_listener`] runs one consumer on a dedicated
//! worker task.
//!
//! ## Architecture
//! ```text
//! Bus ──► broadcast receiver ──► worker task ──► subscriber.on_event()
//!                                     └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Events are processed sequentially (FIFO) per listener.
//! - A panicking subscriber is isolated; the worker keeps consuming.
//! - A lagged receiver skips the overwritten events and keeps going.
//! - The worker stops when the bus closes or the token is cancelled.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//!
//! use janitor::{spawn_listener, Event, EventKind, Janitor, Subscribe};
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Subscribe for Metrics {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::DischargeFailed) {
//!             // export a metric, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//!
//! # async fn demo() {
//! let registry = Janitor::new();
//! let stop = CancellationToken::new();
//! let worker = spawn_listener(registry.bus(), stop.clone(), Arc::new(Metrics));
//!
//! // ... use the registry ...
//!
//! stop.cancel();
//! let _ = worker.await;
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::DischargeError;
use crate::events::{Bus, Event, EventKind};

/// Event subscriber for registry observability.
///
/// Implementations should use async I/O, avoid blocking the executor and
/// handle their own errors; panics are caught by the listener worker and
/// reported as [`EventKind::SubscriberPanicked`].
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in panic reports.
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit"). The
    /// default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Spawns a worker task that drains a bus receiver into a subscriber.
///
/// The worker runs until `token` is cancelled or the bus is closed. Panics
/// inside `on_event` are caught and published as
/// [`EventKind::SubscriberPanicked`], except while handling a panic report
/// itself (avoids a publish loop; the panic is written to stderr instead).
pub fn spawn_listener(
    bus: &Bus,
    token: CancellationToken,
    subscriber: Arc<dyn Subscribe>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    let bus = bus.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => {
                        let fut = subscriber.on_event(&ev);
                        if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                            let err = DischargeError::from_panic(payload);
                            if ev.kind == EventKind::SubscriberPanicked {
                                eprintln!(
                                    "[janitor] subscriber '{}' panicked while handling a panic report: {}",
                                    subscriber.name(),
                                    err.as_message()
                                );
                            } else {
                                bus.publish(
                                    Event::now(EventKind::SubscriberPanicked)
                                        .with_label(subscriber.name())
                                        .with_error(err.as_message()),
                                );
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    struct Recorder {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            if event.kind == EventKind::StaleActivity {
                panic!("recorder cannot handle advisories");
            }
            self.seen.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_receives_events_in_order() {
        let bus = Bus::new(16);
        let stop = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = spawn_listener(&bus, stop.clone(), Arc::new(Recorder { seen: Arc::clone(&seen) }));

        bus.publish(Event::now(EventKind::SweepStarted));
        bus.publish(Event::now(EventKind::SweepFinished));
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::SweepStarted, EventKind::SweepFinished]
        );

        stop.cancel();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_survives_subscriber_panic() {
        let bus = Bus::new(16);
        let stop = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let worker = spawn_listener(&bus, stop.clone(), Arc::new(Recorder { seen: Arc::clone(&seen) }));

        bus.publish(Event::now(EventKind::StaleActivity));
        bus.publish(Event::now(EventKind::SweepStarted));
        tokio::time::sleep(Duration::from_millis(5)).await;

        // The panic on the advisory was isolated; later events still arrive.
        assert!(seen.lock().unwrap().contains(&EventKind::SweepStarted));

        stop.cancel();
        worker.await.unwrap();
    }
}
