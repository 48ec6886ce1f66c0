//! # Janitor: the keyed cleanup-obligation registry.
//!
//! Tracks every obligation under a [`Key`] and guarantees exactly-once
//! discharge through three paths:
//! - overwrite: `set(key, new)` discharges whatever the key held before;
//! - removal: `set(key, None)` / `remove(key)` discharges the entry;
//! - sweep: `clean()` / `destroy()` drains the whole registry.
//!
//! ## Architecture
//! ```text
//! Janitor (Arc) ──► Mutex<State>
//!                     ├─ entries: HashMap<Key, Obligation>
//!                     ├─ labels:  HashMap<u64, String>
//!                     └─ next_seq
//! ```
//!
//! ## Rules
//! - The registry owns every stored obligation; ownership moves out of the
//!   map the instant discharge begins, so re-entrant access to the same key
//!   can never double-discharge.
//! - The state lock is never held while user cleanup code runs. Every
//!   mutation is extract-then-act: remove under the lock, discharge after
//!   releasing it. Re-entrant calls observe a consistent, already-updated
//!   map.
//! - `set` stores the new value before discharging the old one, so a
//!   discharge routine that touches the same key sees the new value.
//! - After a sweep the registry is empty but stays usable; there is no
//!   permanently-dead terminal state.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{select, Either};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

use crate::config::Config;
use crate::error::{DischargeError, RegistryError};
use crate::events::{Bus, Event, EventKind};
use crate::obligation::Obligation;
use crate::registry::Key;
use crate::timer::{self, ActivityHandle};

struct State {
    entries: HashMap<Key, Obligation>,
    labels: HashMap<u64, String>,
    next_seq: u64,
}

struct Inner {
    state: Mutex<State>,
    bus: Bus,
    config: Config,
}

/// Keyed registry of cleanup obligations.
///
/// Cheap to clone; clones share the same underlying registry. Thread-safe,
/// though the contract only requires cooperative single-threaded
/// interleaving.
///
/// # Example
/// ```
/// use janitor::{Janitor, Obligation};
///
/// let registry = Janitor::new();
///
/// registry.set("conn", Obligation::action(|| println!("closed"))).unwrap();
/// // Overwriting the key discharges the previous obligation.
/// registry.set("conn", Obligation::action(|| println!("closed v2"))).unwrap();
///
/// registry.clean();
/// assert!(registry.is_empty());
/// ```
#[derive(Clone)]
pub struct Janitor {
    inner: Arc<Inner>,
}

impl Janitor {
    /// Creates an empty registry with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty registry with the given configuration and its own
    /// event bus.
    pub fn with_config(config: Config) -> Self {
        let bus = Bus::new(config.bus_capacity);
        Self::with_bus(config, bus)
    }

    /// Creates an empty registry publishing to an existing bus.
    ///
    /// Useful for nested registries that should report into their parent's
    /// event stream.
    pub fn with_bus(config: Config, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    labels: HashMap::new(),
                    next_seq: 0,
                }),
                bus,
                config,
            }),
        }
    }

    /// Returns the registry's event bus.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Subscribes to the registry's event stream.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Registers an anonymous obligation under a fresh sequence key.
    ///
    /// Fails with [`RegistryError::NilObligation`] when handed `None`.
    ///
    /// # Example
    /// ```
    /// use janitor::{Janitor, Key, Obligation};
    ///
    /// let registry = Janitor::new();
    /// let key = registry.add(Obligation::action(|| {})).unwrap();
    /// assert_eq!(key, Key::Seq(0));
    ///
    /// let err = registry.add(None).unwrap_err();
    /// assert_eq!(err.as_label(), "nil_obligation");
    /// ```
    pub fn add(&self, obligation: impl Into<Option<Obligation>>) -> Result<Key, RegistryError> {
        self.add_inner(obligation.into(), None)
    }

    /// Like [`Janitor::add`], additionally attaching a human-readable label
    /// for introspection.
    pub fn add_labeled(
        &self,
        obligation: impl Into<Option<Obligation>>,
        label: impl Into<String>,
    ) -> Result<Key, RegistryError> {
        self.add_inner(obligation.into(), Some(label.into()))
    }

    fn add_inner(
        &self,
        obligation: Option<Obligation>,
        label: Option<String>,
    ) -> Result<Key, RegistryError> {
        let obligation = obligation.ok_or(RegistryError::NilObligation)?;
        self.validate(&obligation)?;
        self.advise(&obligation);
        Ok(self.insert_anonymous(obligation, label))
    }

    /// Assignment-style write: stores `value` under `key`.
    ///
    /// - A reserved key fails with [`RegistryError::ReservedKey`].
    /// - `None` removes the entry and discharges it (no-op for vacant keys).
    /// - Assigning the identical handle-backed value already stored under
    ///   `key` is a no-op, so a value is never discharged by the write that
    ///   stores it.
    /// - Otherwise the new value is stored **first** and the prior value
    ///   discharged afterwards. Discharge may re-enter the registry; it will
    ///   observe the new value already in place.
    ///
    /// # Example
    /// ```
    /// use janitor::{Janitor, Obligation};
    ///
    /// let registry = Janitor::new();
    /// registry.set("feed", Obligation::subscription_fn(|| {})).unwrap();
    ///
    /// let err = registry.set("clean", Obligation::action(|| {})).unwrap_err();
    /// assert_eq!(err.as_label(), "reserved_key");
    /// ```
    pub fn set(
        &self,
        key: impl Into<Key>,
        value: impl Into<Option<Obligation>>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        if key.is_reserved() {
            return Err(RegistryError::ReservedKey {
                key: key.to_string(),
            });
        }

        match value.into() {
            Some(value) => {
                self.validate(&value)?;
                self.advise(&value);

                let prior = {
                    let mut st = self.state();
                    if let Some(existing) = st.entries.get(&key) {
                        if existing.same_identity(&value) {
                            return Ok(());
                        }
                    }
                    // Store before discharging the old value (see module docs).
                    st.entries.insert(key.clone(), value)
                };

                match prior {
                    Some(old) => {
                        self.debug_publish(
                            Event::now(EventKind::ObligationReplaced).with_key(&key),
                        );
                        old.discharge(&self.inner.bus, Some(&key));
                    }
                    None => {
                        self.debug_publish(Event::now(EventKind::ObligationAdded).with_key(&key));
                    }
                }
                Ok(())
            }
            None => {
                let prior = {
                    let mut st = self.state();
                    if let Key::Seq(n) = &key {
                        st.labels.remove(n);
                    }
                    st.entries.remove(&key)
                };
                if let Some(old) = prior {
                    self.debug_publish(Event::now(EventKind::ObligationRemoved).with_key(&key));
                    old.discharge(&self.inner.bus, Some(&key));
                }
                Ok(())
            }
        }
    }

    /// Removes and discharges the entry under `key`. Alias for
    /// `set(key, None)`.
    pub fn remove(&self, key: impl Into<Key>) -> Result<(), RegistryError> {
        self.set(key, None)
    }

    /// Returns a snapshot of the label map (sequence key → label).
    ///
    /// The snapshot is an independent copy; mutating it does not affect the
    /// registry.
    pub fn labels(&self) -> HashMap<u64, String> {
        self.state().labels.clone()
    }

    /// Returns the sorted list of current keys.
    pub fn list(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.state().entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Returns true if the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Discharges every obligation currently held, and every obligation
    /// registered while the sweep is in progress, leaving the registry
    /// empty (and reusable).
    ///
    /// Two phases:
    /// 1. every Subscription entry is extracted and discharged, so event
    ///    feeds are silenced before any other side effect runs;
    /// 2. remaining entries are extracted and discharged one at a time, in
    ///    map order (unspecified). Because an entry is removed before its
    ///    discharge runs, cleanup code may register new entries and the
    ///    loop still finds them; nothing is ever visited twice.
    ///
    /// A failure while discharging one obligation is published as
    /// [`EventKind::DischargeFailed`] and does not stop the sweep.
    pub fn clean(&self) {
        self.debug_publish(Event::now(EventKind::SweepStarted));

        let mut discharged: usize = 0;
        while let Some((key, obligation)) = self.take(Obligation::is_subscription) {
            discharged += 1;
            obligation.discharge(&self.inner.bus, Some(&key));
        }
        while let Some((key, obligation)) = self.take(|_| true) {
            discharged += 1;
            obligation.discharge(&self.inner.bus, Some(&key));
        }

        self.state().labels.clear();
        self.debug_publish(Event::now(EventKind::SweepFinished).with_count(discharged));
    }

    /// Full teardown. Alias for [`Janitor::clean`]: the registry holds no
    /// entries afterwards but deliberately remains usable, there is no
    /// permanently-dead state.
    pub fn destroy(&self) {
        self.clean()
    }

    /// Tracks a spawned task until it settles.
    ///
    /// - An already-finished handle is passed through without touching the
    ///   registry.
    /// - A pending handle is tracked as an activity obligation under a fresh
    ///   key (labelled `pending-future`). When the task settles on its own,
    ///   the key is removed *without* discharging: settlement is the natural
    ///   terminal state, not a cancellation. If the registry discharges the
    ///   obligation first (overwrite or sweep), the task is aborted.
    ///
    /// The returned handle yields the inner task's own join result.
    ///
    /// # Example
    /// ```no_run
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use janitor::Janitor;
    ///
    /// let registry = Janitor::new();
    /// let pending = tokio::spawn(async { fetch().await });
    ///
    /// let tracked = registry.adopt(pending);
    /// assert_eq!(registry.len(), 1);
    ///
    /// let value = tracked.await.unwrap().unwrap();
    /// assert!(registry.is_empty());
    /// # let _ = value;
    /// # }
    /// # async fn fetch() -> u32 { 42 }
    /// ```
    pub fn adopt<T>(&self, handle: JoinHandle<T>) -> JoinHandle<Result<T, JoinError>>
    where
        T: Send + 'static,
    {
        if handle.is_finished() {
            return tokio::spawn(async move { handle.await });
        }

        let activity = ActivityHandle::new();
        let token = activity.token().clone();
        let key = self.insert_anonymous(
            Obligation::Activity(activity),
            Some("pending-future".to_string()),
        );

        let me = self.clone();
        tokio::spawn(async move {
            let out = match select(handle, Box::pin(token.cancelled_owned())).await {
                Either::Left((out, _)) => out,
                Either::Right(((), handle)) => {
                    handle.abort();
                    handle.await
                }
            };
            me.release(&key);
            out
        })
    }

    /// Starts a cancellable repeating activity: invoke `callback`, suspend
    /// for `period`, repeat until cancelled.
    ///
    /// The activity is registered into this registry (so a sweep cancels
    /// it) and its handle is returned for manual cancellation. A callback
    /// error or panic publishes [`EventKind::TimerFailed`] and stops the
    /// loop; it is not retried. Cancellation lets an in-flight invocation
    /// finish and prevents any further invocation.
    ///
    /// Fails with [`RegistryError::InvalidArgument`] for a zero period.
    pub fn interval<F, Fut>(
        &self,
        period: Duration,
        callback: F,
    ) -> Result<ActivityHandle, RegistryError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), DischargeError>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(RegistryError::InvalidArgument {
                reason: "interval period must be greater than zero".to_string(),
            });
        }

        let handle = timer::spawn_interval(self.inner.bus.clone(), period, callback);
        self.insert_anonymous(
            Obligation::Activity(handle.clone()),
            Some("interval".to_string()),
        );
        Ok(handle)
    }

    /// Schedules a single deferred discharge of `obligation` after `delay`.
    ///
    /// The activity is registered into this registry and its handle
    /// returned. Cancelling the handle before the delay elapses prevents
    /// the deferred discharge from ever running; the cancel/fire race is
    /// decided atomically, at most one of the two happens.
    ///
    /// Fails with [`RegistryError::InvalidArgument`] when handed `None`.
    pub fn delayed(
        &self,
        delay: Duration,
        obligation: impl Into<Option<Obligation>>,
    ) -> Result<ActivityHandle, RegistryError> {
        let obligation = obligation
            .into()
            .ok_or_else(|| RegistryError::InvalidArgument {
                reason: "delayed requires an obligation to discharge".to_string(),
            })?;
        self.validate(&obligation)?;

        let handle = timer::spawn_delayed(self.inner.bus.clone(), delay, obligation);
        self.insert_anonymous(
            Obligation::Activity(handle.clone()),
            Some("delayed".to_string()),
        );
        Ok(handle)
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    /// Identity check for nested-registry guards and `set` no-op detection.
    pub(crate) fn same(&self, other: &Janitor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Removes an entry without discharging it (future settlement path).
    pub(crate) fn release(&self, key: &Key) {
        let removed = {
            let mut st = self.state();
            if let Key::Seq(n) = key {
                st.labels.remove(n);
            }
            st.entries.remove(key)
        };
        if removed.is_some() {
            self.debug_publish(Event::now(EventKind::ObligationRemoved).with_key(key));
        }
    }

    /// Poison-tolerant lock. User code never runs under the lock, so a
    /// poisoned state is still consistent.
    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn validate(&self, obligation: &Obligation) -> Result<(), RegistryError> {
        if let Obligation::Registry(nested) = obligation {
            if nested.same(self) {
                return Err(RegistryError::InvalidObligation {
                    reason: "a registry cannot be registered into itself".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Advisory diagnostics for suspicious registrations.
    fn advise(&self, obligation: &Obligation) {
        if let Obligation::Activity(handle) = obligation {
            if handle.is_cancelled() {
                self.inner.bus.publish(Event::now(EventKind::StaleActivity));
            }
        }
    }

    fn insert_anonymous(&self, obligation: Obligation, label: Option<String>) -> Key {
        let key = {
            let mut st = self.state();
            let mut seq = st.next_seq;
            // Skip numbers the caller claimed through `set`.
            while st.entries.contains_key(&Key::Seq(seq)) {
                seq += 1;
            }
            st.next_seq = seq + 1;

            let key = Key::Seq(seq);
            if let Some(label) = &label {
                st.labels.insert(seq, label.clone());
            }
            st.entries.insert(key.clone(), obligation);
            key
        };

        let mut ev = Event::now(EventKind::ObligationAdded).with_key(&key);
        if let Some(label) = label {
            ev = ev.with_label(label);
        }
        self.debug_publish(ev);
        key
    }

    fn take<P>(&self, pick: P) -> Option<(Key, Obligation)>
    where
        P: Fn(&Obligation) -> bool,
    {
        let mut st = self.state();
        let key = st
            .entries
            .iter()
            .find(|(_, obligation)| pick(obligation))
            .map(|(key, _)| key.clone())?;
        if let Key::Seq(n) = &key {
            st.labels.remove(n);
        }
        let obligation = st.entries.remove(&key)?;
        Some((key, obligation))
    }

    fn debug_publish(&self, ev: Event) {
        if self.inner.config.debug {
            self.inner.bus.publish(ev);
        }
    }
}

impl Default for Janitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::obligation::Dispose;

    fn counter_action(counter: &Arc<AtomicUsize>) -> Obligation {
        let counter = Arc::clone(counter);
        Obligation::action(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    struct TaggedResource {
        tag: &'static str,
        log: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl Dispose for TaggedResource {
        fn dispose(self: Box<Self>) -> Result<(), DischargeError> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    #[test]
    fn test_add_allocates_sequential_keys() {
        let registry = Janitor::new();
        assert_eq!(registry.add(Obligation::action(|| {})).unwrap(), Key::Seq(0));
        assert_eq!(registry.add(Obligation::action(|| {})).unwrap(), Key::Seq(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_skips_caller_claimed_sequence_numbers() {
        let registry = Janitor::new();
        registry.set(Key::Seq(0), Obligation::action(|| {})).unwrap();
        let key = registry.add(Obligation::action(|| {})).unwrap();
        assert_eq!(key, Key::Seq(1));
    }

    #[test]
    fn test_add_nil_fails() {
        let registry = Janitor::new();
        let err = registry.add(None).unwrap_err();
        assert!(matches!(err, RegistryError::NilObligation));
    }

    #[test]
    fn test_set_reserved_key_fails() {
        let registry = Janitor::new();
        for name in crate::registry::RESERVED_KEYS {
            let err = registry.set(*name, Obligation::action(|| {})).unwrap_err();
            assert!(
                matches!(err, RegistryError::ReservedKey { .. }),
                "{name} should be rejected"
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overwrite_discharges_old_exactly_once() {
        let registry = Janitor::new();
        let old = Arc::new(AtomicUsize::new(0));
        let new = Arc::new(AtomicUsize::new(0));

        registry.set("k", counter_action(&old)).unwrap();
        registry.set("k", counter_action(&new)).unwrap();

        assert_eq!(old.load(Ordering::SeqCst), 1);
        assert_eq!(new.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);

        registry.clean();
        assert_eq!(old.load(Ordering::SeqCst), 1);
        assert_eq!(new.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_identity_reassignment_is_noop() {
        let registry = Janitor::new();
        let child = Janitor::new();
        let dropped = Arc::new(AtomicUsize::new(0));
        child.add(counter_action(&dropped)).unwrap();

        registry.set("child", Obligation::from(child.clone())).unwrap();
        registry.set("child", Obligation::from(child.clone())).unwrap();

        // The nested registry was not discharged by the re-assignment.
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert_eq!(child.len(), 1);

        registry.set("child", None).unwrap();
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert!(child.is_empty());
    }

    #[test]
    fn test_activity_handle_reassignment_is_noop() {
        let registry = Janitor::new();
        let handle = ActivityHandle::new();

        registry.set("timer", Obligation::from(handle.clone())).unwrap();
        registry.set("timer", Obligation::from(handle.clone())).unwrap();

        // Re-assigning the same handle must not cancel it.
        assert!(!handle.is_cancelled());
        assert_eq!(registry.len(), 1);

        registry.clean();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_overwrite_stores_new_before_discharging_old() {
        let registry = Janitor::new();
        let observed = Arc::new(StdMutex::new(Vec::new()));

        let nosy = {
            let registry = registry.clone();
            let observed = Arc::clone(&observed);
            Obligation::action(move || {
                observed.lock().unwrap().push(registry.list());
            })
        };
        registry.set("k", nosy).unwrap();
        registry.set("k", Obligation::action(|| {})).unwrap();

        // The old obligation's discharge ran after the new value was stored,
        // so it saw "k" still occupied.
        let observed = observed.lock().unwrap();
        assert_eq!(*observed, vec![vec![Key::from("k")]]);
    }

    #[test]
    fn test_set_nil_removes_and_discharges() {
        let registry = Janitor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.set("k", counter_action(&counter)).unwrap();
        registry.set("k", None).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());

        // Removing a vacant key is a quiet no-op.
        registry.set("k", None).unwrap();
        registry.remove("other").unwrap();
    }

    #[test]
    fn test_self_registration_rejected() {
        let registry = Janitor::new();
        let err = registry
            .set("self", Obligation::from(registry.clone()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidObligation { .. }));

        let err = registry.add(Obligation::from(registry.clone())).unwrap_err();
        assert_eq!(err.as_label(), "invalid_obligation");
    }

    #[test]
    fn test_clean_discharges_subscriptions_first() {
        let registry = Janitor::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let l = Arc::clone(&log);
        registry
            .set("action", Obligation::action(move || l.lock().unwrap().push("action")))
            .unwrap();
        registry
            .add(Obligation::disposable(TaggedResource {
                tag: "disposable",
                log: Arc::clone(&log),
            }))
            .unwrap();
        let l = Arc::clone(&log);
        registry
            .set("feed", Obligation::subscription_fn(move || l.lock().unwrap().push("subscription")))
            .unwrap();

        registry.clean();

        let order = log.lock().unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], "subscription");
    }

    #[test]
    fn test_subscription_registered_by_phase_one_is_silenced_first() {
        let registry = Janitor::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let l = Arc::clone(&log);
        registry
            .set("action", Obligation::action(move || l.lock().unwrap().push("action")))
            .unwrap();

        // Tearing down the first feed hooks up (and registers) a second one.
        let chained = {
            let registry = registry.clone();
            let log = Arc::clone(&log);
            Obligation::subscription_fn(move || {
                log.lock().unwrap().push("feed-1");
                let log = Arc::clone(&log);
                registry
                    .add(Obligation::subscription_fn(move || {
                        log.lock().unwrap().push("feed-2");
                    }))
                    .unwrap();
            })
        };
        registry.set("feed", chained).unwrap();

        registry.clean();

        let order = log.lock().unwrap();
        assert_eq!(*order, vec!["feed-1", "feed-2", "action"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clean_handles_obligations_added_mid_sweep() {
        let registry = Janitor::new();
        let late = Arc::new(AtomicUsize::new(0));

        let re_entrant = {
            let registry = registry.clone();
            let late = Arc::clone(&late);
            Obligation::action(move || {
                let late = Arc::clone(&late);
                registry
                    .add(Obligation::action(move || {
                        late.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
            })
        };
        registry.add(re_entrant).unwrap();

        registry.clean();

        assert_eq!(late.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clean_empty_registry_is_noop() {
        let registry = Janitor::new();
        registry.clean();
        assert!(registry.is_empty());
        assert!(registry.labels().is_empty());
    }

    #[test]
    fn test_clean_clears_labels_and_registry_stays_usable() {
        let registry = Janitor::new();
        registry
            .add_labeled(Obligation::action(|| {}), "cache")
            .unwrap();
        assert_eq!(registry.labels().len(), 1);

        registry.destroy();
        assert!(registry.is_empty());
        assert!(registry.labels().is_empty());

        // Still usable after a full teardown.
        let key = registry.add(Obligation::action(|| {})).unwrap();
        assert!(matches!(key, Key::Seq(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_nested_registry_cleaned_recursively() {
        let parent = Janitor::new();
        let child = Janitor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        child.add(counter_action(&counter)).unwrap();
        parent.add(Obligation::from(child.clone())).unwrap();

        parent.clean();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(child.is_empty());
        assert!(parent.is_empty());
    }

    #[test]
    fn test_discharge_failure_does_not_stop_sweep() {
        let registry = Janitor::new();
        let mut rx = registry.events();
        let survivor = Arc::new(AtomicUsize::new(0));

        registry
            .set("bad", Obligation::try_action(|| Err(DischargeError::failed("boom"))))
            .unwrap();
        registry.set("good", counter_action(&survivor)).unwrap();

        registry.clean();

        assert_eq!(survivor.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());

        let mut saw_failure = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::DischargeFailed {
                assert!(ev.error.as_deref().unwrap_or_default().contains("boom"));
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[test]
    fn test_discharge_panic_is_isolated() {
        let registry = Janitor::new();
        let survivor = Arc::new(AtomicUsize::new(0));

        registry
            .set("panicky", Obligation::action(|| panic!("cleanup blew up")))
            .unwrap();
        registry.set("good", counter_action(&survivor)).unwrap();

        registry.clean();

        assert_eq!(survivor.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_labels_snapshot_is_independent() {
        let registry = Janitor::new();
        registry
            .add_labeled(Obligation::action(|| {}), "db")
            .unwrap();

        let mut snapshot = registry.labels();
        assert_eq!(snapshot.get(&0).map(String::as_str), Some("db"));

        snapshot.insert(99, "bogus".to_string());
        assert_eq!(registry.labels().len(), 1);
    }

    #[test]
    fn test_list_is_sorted() {
        let registry = Janitor::new();
        registry.set("zeta", Obligation::action(|| {})).unwrap();
        registry.add(Obligation::action(|| {})).unwrap();
        registry.set("alpha", Obligation::action(|| {})).unwrap();

        assert_eq!(
            registry.list(),
            vec![Key::Seq(0), Key::from("alpha"), Key::from("zeta")]
        );
    }

    #[test]
    fn test_stale_activity_advisory() {
        let registry = Janitor::new();
        let mut rx = registry.events();

        let handle = ActivityHandle::new();
        handle.cancel();
        registry.add(Obligation::from(handle)).unwrap();

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::StaleActivity);
        // Advisory, not a rejection: the entry is stored regardless.
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adopt_settled_handle_passes_through() {
        let registry = Janitor::new();
        let inner = tokio::spawn(async { 42_u32 });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(inner.is_finished());

        let tracked = registry.adopt(inner);
        assert!(registry.is_empty());
        assert_eq!(tracked.await.unwrap().unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_adopt_pending_handle_registers_until_settlement() {
        let registry = Janitor::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let inner = tokio::spawn(async move {
            let _ = rx.await;
            7_u32
        });

        let tracked = registry.adopt(inner);
        assert_eq!(registry.len(), 1);
        assert!(registry
            .labels()
            .values()
            .any(|label| label == "pending-future"));

        tx.send(()).unwrap();
        assert_eq!(tracked.await.unwrap().unwrap(), 7);

        // Settlement removed the entry without discharging it.
        assert!(registry.is_empty());
        assert!(registry.labels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_adopt_sweep_aborts_pending_task() {
        let registry = Janitor::new();
        let (_keep, rx) = tokio::sync::oneshot::channel::<()>();
        let inner = tokio::spawn(async move {
            let _ = rx.await;
            7_u32
        });

        let tracked = registry.adopt(inner);
        assert_eq!(registry.len(), 1);

        registry.clean();

        let joined = tracked.await.unwrap();
        assert!(joined.unwrap_err().is_cancelled());
        assert!(registry.is_empty());
    }
}
