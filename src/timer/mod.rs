//! # Cancellable timer constructs.
//!
//! [`ActivityHandle`] is the cancel handle shared by every cooperative
//! background activity the registry tracks: interval loops, deferred
//! discharges and adopted futures. The spawn functions here implement the
//! two timer shapes exposed through [`Janitor::interval`](crate::Janitor::interval)
//! and [`Janitor::delayed`](crate::Janitor::delayed).
//!
//! ## Rules
//! - Cancellation is a request, not a wait-for-stop: `cancel()` returns
//!   immediately and the activity winds down at its next suspension point.
//! - An in-flight interval callback finishes; no new invocation starts once
//!   cancellation is requested.
//! - The delayed fire/cancel race is decided at a single `select!` point,
//!   at most one of the two happens.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::DischargeError;
use crate::events::{Bus, Event, EventKind};
use crate::obligation::Obligation;

/// Cancel handle for a running cooperative activity.
///
/// Clones share identity: cancelling any clone cancels the activity, and the
/// registry treats clones of one handle as the same obligation when a key is
/// re-assigned. Cancelling twice is a no-op.
#[derive(Clone, Debug)]
pub struct ActivityHandle {
    inner: Arc<ActivityInner>,
}

#[derive(Debug)]
struct ActivityInner {
    token: CancellationToken,
}

impl ActivityHandle {
    /// Creates a handle with a fresh cancellation token.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wraps an existing token, e.g. to track an activity whose lifetime is
    /// managed elsewhere.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(ActivityInner { token }),
        }
    }

    /// Requests cancellation. Idempotent; returns without waiting for the
    /// activity to stop.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// The underlying cancellation token, for activities that want to wire
    /// the handle into their own `select!` loops.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub(crate) fn same(&self, other: &ActivityHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ActivityHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the repeating loop behind `interval`.
///
/// Invoke, then suspend for `period`, until cancelled or the callback fails.
/// Callback panics are caught; both errors and panics publish
/// [`EventKind::TimerFailed`] and stop the loop.
pub(crate) fn spawn_interval<F, Fut>(bus: Bus, period: Duration, mut callback: F) -> ActivityHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), DischargeError>> + Send + 'static,
{
    let handle = ActivityHandle::new();
    let token = handle.token().clone();

    tokio::spawn(async move {
        loop {
            if token.is_cancelled() {
                break;
            }

            let outcome = AssertUnwindSafe(async { callback().await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    bus.publish(Event::now(EventKind::TimerFailed).with_error(err.as_message()));
                    break;
                }
                Err(payload) => {
                    let err = DischargeError::from_panic(payload);
                    bus.publish(Event::now(EventKind::TimerFailed).with_error(err.as_message()));
                    break;
                }
            }

            tokio::select! {
                _ = time::sleep(period) => {}
                _ = token.cancelled() => break,
            }
        }
    });

    handle
}

/// Spawns the single deferred discharge behind `delayed`.
///
/// The fire/cancel race is decided by one `select!`: either the delay
/// elapses and the obligation is discharged, or cancellation wins and the
/// obligation is dropped undischarged.
pub(crate) fn spawn_delayed(bus: Bus, delay: Duration, obligation: Obligation) -> ActivityHandle {
    let handle = ActivityHandle::new();
    let token = handle.token().clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = time::sleep(delay) => {
                obligation.discharge(&bus, None);
            }
            _ = token.cancelled() => {}
        }
    });

    handle
}
