//! Traits satisfied by caller-owned cleanup resources.

use crate::error::DischargeError;

/// A resource with an explicit, one-shot dispose capability.
///
/// The receiver is `Box<Self>`: disposal consumes the resource, so a second
/// call is unrepresentable once ownership has moved into the registry.
///
/// # Example
/// ```
/// use janitor::{DischargeError, Dispose, Janitor, Obligation};
///
/// struct TempDir {
///     path: String,
/// }
///
/// impl Dispose for TempDir {
///     fn dispose(self: Box<Self>) -> Result<(), DischargeError> {
///         // std::fs::remove_dir_all(&self.path) ...
///         let _ = self.path;
///         Ok(())
///     }
/// }
///
/// let registry = Janitor::new();
/// registry.add(Obligation::disposable(TempDir { path: "/tmp/scratch".into() })).unwrap();
/// registry.clean();
/// ```
pub trait Dispose: Send + 'static {
    /// Performs the cleanup. Errors are reported on the owning registry's
    /// bus, never propagated out of a sweep.
    fn dispose(self: Box<Self>) -> Result<(), DischargeError>;
}

/// A handle to an active event subscription.
///
/// Unsubscribing must be idempotent on the host side; the registry calls it
/// at most once per handle. During a sweep all subscriptions are discharged
/// before any other obligation, so event feeds are silenced before other
/// cleanup side effects run.
pub trait Unsubscribe: Send + 'static {
    /// Tears down the subscription.
    fn unsubscribe(self: Box<Self>);
}

/// Closure adapter for [`Unsubscribe`].
pub(crate) struct UnsubscribeFn<F>(pub(crate) F);

impl<F> Unsubscribe for UnsubscribeFn<F>
where
    F: FnOnce() + Send + 'static,
{
    fn unsubscribe(self: Box<Self>) {
        (self.0)()
    }
}
