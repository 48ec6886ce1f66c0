//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [added] key=seq:0 label="cache"
//! [replaced] key=feed
//! [removed] key=seq:1
//! [sweep-start]
//! [sweep-done] discharged=4
//! [discharge-failed] key=seq:2 err="cleanup failed: socket already closed"
//! [timer-failed] err="cleanup panicked: tick 3"
//! [stale-activity]
//! [subscriber-panicked] name=metrics
//! ```
//!
//! Not intended for production use. Implement a custom
//! [`Subscribe`](crate::Subscribe) for structured logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind, Subscribe};

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Pair it with
/// [`spawn_listener`](crate::spawn_listener) and a registry configured with
/// `debug = true` to watch the full lifecycle.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ObligationAdded => match (&e.key, &e.label) {
                (Some(key), Some(label)) => println!("[added] key={key} label={label:?}"),
                (Some(key), None) => println!("[added] key={key}"),
                _ => println!("[added]"),
            },
            EventKind::ObligationReplaced => {
                if let Some(key) = &e.key {
                    println!("[replaced] key={key}");
                }
            }
            EventKind::ObligationRemoved => {
                if let Some(key) = &e.key {
                    println!("[removed] key={key}");
                }
            }
            EventKind::SweepStarted => {
                println!("[sweep-start]");
            }
            EventKind::SweepFinished => {
                println!("[sweep-done] discharged={}", e.count.unwrap_or(0));
            }
            EventKind::DischargeFailed => match (&e.key, &e.error) {
                (Some(key), Some(err)) => println!("[discharge-failed] key={key} err={err:?}"),
                (None, Some(err)) => println!("[discharge-failed] err={err:?}"),
                _ => println!("[discharge-failed]"),
            },
            EventKind::TimerFailed => {
                println!("[timer-failed] err={:?}", e.error);
            }
            EventKind::StaleActivity => {
                println!("[stale-activity]");
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] name={:?} err={:?}",
                    e.label, e.error
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
