//! # Obligation: the closed set of cleanup shapes.
//!
//! [`Obligation`] is a tagged union over every kind of cleanup work the
//! registry tracks. Each shape has exactly one way to be discharged, and the
//! dispatcher matches shapes in a fixed precedence order:
//!
//! ```text
//! Subscription → unsubscribe()      (silenced first during sweeps)
//! Action       → invoke once
//! Disposable   → dispose()
//! Registry     → clean() recursively
//! Activity     → cancel()           (request, not wait-for-stop)
//! ```
//!
//! ## Failure isolation
//! User code runs inside `catch_unwind`; an `Err` or a panic is published as
//! [`EventKind::DischargeFailed`] on the owning registry's bus and never
//! propagates. One bad obligation cannot abort a sweep.
//!
//! ## Identity
//! Shapes backed by shared handles (nested registries, activity handles)
//! compare by identity so that re-assigning the same value to the same key is
//! a no-op instead of a self-triggered discharge. Boxed shapes (actions,
//! disposables, subscriptions) are always distinct.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::DischargeError;
use crate::events::{Bus, Event, EventKind};
use crate::obligation::traits::{Dispose, Unsubscribe, UnsubscribeFn};
use crate::registry::{Janitor, Key};
use crate::timer::ActivityHandle;

/// Boxed one-shot cleanup callback.
pub type ActionFn = Box<dyn FnOnce() -> Result<(), DischargeError> + Send>;

/// A unit of cleanup work tracked by a [`Janitor`].
///
/// Construct one with the shape constructors ([`Obligation::action`],
/// [`Obligation::disposable`], [`Obligation::subscription`], ...) or the
/// `From` conversions for [`Janitor`] and [`ActivityHandle`].
pub enum Obligation {
    /// An active event feed hookup; discharged first during sweeps.
    Subscription(Box<dyn Unsubscribe>),
    /// A zero-argument callback, invoked once.
    Action(ActionFn),
    /// A resource with an explicit dispose capability.
    Disposable(Box<dyn Dispose>),
    /// A nested registry, swept recursively.
    Registry(Janitor),
    /// A running cooperative activity, cancelled on discharge.
    Activity(ActivityHandle),
}

impl Obligation {
    /// Wraps an infallible callback.
    pub fn action<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Obligation::Action(Box::new(move || {
            f();
            Ok(())
        }))
    }

    /// Wraps a fallible callback. Errors surface as
    /// [`EventKind::DischargeFailed`] events.
    pub fn try_action<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), DischargeError> + Send + 'static,
    {
        Obligation::Action(Box::new(f))
    }

    /// Wraps a disposable resource.
    pub fn disposable<D>(d: D) -> Self
    where
        D: Dispose,
    {
        Obligation::Disposable(Box::new(d))
    }

    /// Wraps a subscription handle.
    pub fn subscription<S>(s: S) -> Self
    where
        S: Unsubscribe,
    {
        Obligation::Subscription(Box::new(s))
    }

    /// Wraps a plain closure as a subscription teardown.
    pub fn subscription_fn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Obligation::Subscription(Box::new(UnsubscribeFn(f)))
    }

    /// Returns a short stable label (snake_case) for the shape, for use in
    /// logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Obligation::Subscription(_) => "subscription",
            Obligation::Action(_) => "action",
            Obligation::Disposable(_) => "disposable",
            Obligation::Registry(_) => "registry",
            Obligation::Activity(_) => "activity",
        }
    }

    /// True when the subscription-first sweep phase should pick this entry.
    pub(crate) fn is_subscription(&self) -> bool {
        matches!(self, Obligation::Subscription(_))
    }

    /// Identity comparison for handle-backed shapes.
    ///
    /// Assigning a value that is identical to what a key already holds must
    /// be a no-op, otherwise the assignment would discharge the value it is
    /// storing.
    pub(crate) fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Obligation::Registry(a), Obligation::Registry(b)) => a.same(b),
            (Obligation::Activity(a), Obligation::Activity(b)) => a.same(b),
            _ => false,
        }
    }

    /// Performs the one-time discharge side effect for this obligation.
    ///
    /// Precedence order is fixed: Subscription, Action, Disposable, Registry,
    /// Activity. Failures in user code are reported on `bus` and swallowed;
    /// for activities, discharge means "signal cancellation" and returns
    /// without waiting for the activity to stop.
    pub(crate) fn discharge(self, bus: &Bus, key: Option<&Key>) {
        match self {
            Obligation::Subscription(sub) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(move || sub.unsubscribe())) {
                    report(bus, key, DischargeError::from_panic(payload));
                }
            }
            Obligation::Action(f) => match catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => report(bus, key, err),
                Err(payload) => report(bus, key, DischargeError::from_panic(payload)),
            },
            Obligation::Disposable(d) => {
                match catch_unwind(AssertUnwindSafe(move || d.dispose())) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => report(bus, key, err),
                    Err(payload) => report(bus, key, DischargeError::from_panic(payload)),
                }
            }
            Obligation::Registry(nested) => nested.clean(),
            Obligation::Activity(handle) => handle.cancel(),
        }
    }
}

fn report(bus: &Bus, key: Option<&Key>, err: DischargeError) {
    let mut ev = Event::now(EventKind::DischargeFailed).with_error(err.as_message());
    if let Some(key) = key {
        ev = ev.with_key(key);
    }
    bus.publish(ev);
}

impl fmt::Debug for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obligation::{}", self.as_label())
    }
}

impl From<Janitor> for Obligation {
    fn from(registry: Janitor) -> Self {
        Obligation::Registry(registry)
    }
}

impl From<ActivityHandle> for Obligation {
    fn from(handle: ActivityHandle) -> Self {
        Obligation::Activity(handle)
    }
}

impl From<tokio_util::sync::CancellationToken> for Obligation {
    fn from(token: tokio_util::sync::CancellationToken) -> Self {
        Obligation::Activity(ActivityHandle::from_token(token))
    }
}
