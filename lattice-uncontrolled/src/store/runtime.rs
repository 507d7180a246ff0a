//! Atom Store
//!
//! The store owns atom values and coordinates change propagation. Atoms are
//! just handles; two stores hold independent values for the same atom.
//!
//! # How It Works
//!
//! 1. Reading a primitive atom returns the written state, or the atom's
//!    initial state if the store never wrote it.
//!
//! 2. Reading a derived atom returns the cached state when the dependency
//!    graph says it is fresh. Otherwise the read function runs, its reads
//!    become the node's dependencies, and the result is cached.
//!
//! 3. Writing a primitive atom:
//!    a. Stores the new state
//!    b. Marks every transitive dependent dirty
//!    c. Notifies listeners of the written atom, then of each dependent in
//!       dependency order
//!
//! # Locking
//!
//! No lock is held while a read function or a listener runs. Listeners are
//! free to read and write the store; nested writes start their own
//! notification round.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::error::{AtomError, Error, Result};

use super::atom::{Atom, AtomId, AtomKind, Getter, Interrupt, ReadFn, Source};
use super::graph::DependencyGraph;
use super::state::AtomState;
use super::subscriber::{Subscriber, SubscriberId};

/// Counter for generating unique store IDs.
static STORE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

type Slot = Box<dyn Any + Send + Sync>;

struct StoreInner {
    id: u64,

    /// Current state per atom, each slot holding an `AtomState<T>`.
    values: RwLock<HashMap<AtomId, Slot>>,

    /// Read edges between atoms.
    graph: RwLock<DependencyGraph>,

    /// Change listeners per atom.
    listeners: RwLock<HashMap<AtomId, Vec<Subscriber>>>,
}

impl StoreInner {
    fn unsubscribe(&self, atom: AtomId, subscriber: SubscriberId) {
        let mut listeners = self.listeners.write();
        if let Some(subs) = listeners.get_mut(&atom) {
            subs.retain(|s| s.id() != subscriber);
            if subs.is_empty() {
                listeners.remove(&atom);
            }
        }
    }

    fn is_subscribed(&self, atom: AtomId, subscriber: SubscriberId) -> bool {
        self.listeners
            .read()
            .get(&atom)
            .is_some_and(|subs| subs.iter().any(|s| s.id() == subscriber))
    }
}

/// Handle to a registered listener.
///
/// Dropping this handle removes the listener from the store.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<StoreInner>,
    atom: AtomId,
    subscriber: SubscriberId,
}

impl Subscription {
    /// The atom this subscription listens to.
    pub fn atom(&self) -> AtomId {
        self.atom
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.atom, self.subscriber);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("atom", &self.atom)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}

/// A container of atom values.
///
/// Cloning a store yields another handle to the same values.
///
/// State is kept for every atom the store has written or computed, for as
/// long as the store lives. Atoms are never collected on their own: callers
/// that create short-lived atoms (a new derived atom per render, say) should
/// release them with `forget` once nothing reads them.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a new empty store.
    pub fn new() -> Self {
        let id = STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(store = id, "created atom store");

        Self {
            inner: Arc::new(StoreInner {
                id,
                values: RwLock::new(HashMap::new()),
                graph: RwLock::new(DependencyGraph::new()),
                listeners: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Check whether two handles refer to the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the current state of an atom.
    pub fn read<T>(&self, atom: &Atom<T>) -> Result<AtomState<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        match atom.source() {
            Source::Primitive(initial) => match self.cached(atom.id()) {
                Some(state) => state,
                None => Ok(initial.clone()),
            },
            Source::Derived(read) => {
                if self.inner.graph.read().is_fresh(atom.id()) {
                    if let Some(state) = self.cached(atom.id()) {
                        return state;
                    }
                }
                Ok(self.compute(atom.id(), read.as_ref()))
            }
        }
    }

    fn cached<T>(&self, id: AtomId) -> Option<Result<AtomState<T>>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let values = self.inner.values.read();
        values.get(&id).map(|slot| {
            slot.downcast_ref::<AtomState<T>>()
                .cloned()
                .ok_or(Error::NoValue(id))
        })
    }

    /// Run a derived atom's read function and cache the result.
    fn compute<T>(&self, id: AtomId, read: &ReadFn<T>) -> AtomState<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let getter = Getter::new(self);
        let state = match read(&getter) {
            Ok(value) => AtomState::Resolved(value),
            Err(Interrupt::Pending) => AtomState::Pending,
            Err(Interrupt::Failed(err)) => AtomState::Failed(err),
        };
        let dependencies = getter.into_dependencies();

        {
            let mut graph = self.inner.graph.write();
            graph.set_dependencies(id, &dependencies);
            graph.mark_clean(id);
        }
        self.inner
            .values
            .write()
            .insert(id, Box::new(state.clone()));

        tracing::trace!(
            store = self.inner.id,
            atom = %id,
            dependencies = dependencies.len(),
            "recomputed derived atom"
        );
        state
    }

    /// Write a resolved value into a primitive atom.
    pub fn set<T>(&self, atom: &Atom<T>, value: T) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.set_state(atom, AtomState::Resolved(value))
    }

    /// Write a value computed from the current resolved value.
    ///
    /// The function sees `None` while the atom is pending or failed.
    pub fn update<T, F>(&self, atom: &Atom<T>, f: F) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> T,
    {
        let current = self.read(atom)?;
        let next = f(current.value());
        self.set(atom, next)
    }

    /// Write any state into a primitive atom and notify listeners.
    ///
    /// Every listener of the round runs; the first listener failure is
    /// returned.
    pub fn set_state<T>(&self, atom: &Atom<T>, state: AtomState<T>) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
    {
        if atom.kind() == AtomKind::Derived {
            return Err(Error::ReadOnly(atom.id()));
        }

        self.inner.values.write().insert(atom.id(), Box::new(state));

        let affected = self.inner.graph.write().mark_changed(atom.id());
        self.notify(atom.id(), affected)
    }

    /// Mark an atom pending and resolve it from a future.
    ///
    /// Must be called from within a Tokio runtime. The returned task yields
    /// the result of the final write, carrying any listener failure.
    pub fn load<T, F>(&self, atom: &Atom<T>, future: F) -> Result<JoinHandle<Result<()>>>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = std::result::Result<T, AtomError>> + Send + 'static,
    {
        self.set_state(atom, AtomState::Pending)?;

        let store = self.clone();
        let atom = atom.clone();
        Ok(tokio::spawn(async move {
            let state = AtomState::from(future.await);
            let result = store.set_state(&atom, state);
            if let Err(err) = &result {
                tracing::error!(store = store.id(), atom = %atom.id(), error = %err, "listener failed after load");
            }
            result
        }))
    }

    /// Register a listener on an atom.
    ///
    /// The listener runs after every write to the atom or to any atom it
    /// (transitively) derives from. It does not run on registration.
    pub fn subscribe<F>(&self, atom: AtomId, listener: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(listener);
        let id = subscriber.id();

        self.inner
            .listeners
            .write()
            .entry(atom)
            .or_default()
            .push(subscriber);

        Subscription {
            store: Arc::downgrade(&self.inner),
            atom,
            subscriber: id,
        }
    }

    /// Get the number of listeners registered on an atom.
    pub fn listener_count(&self, atom: AtomId) -> usize {
        self.inner
            .listeners
            .read()
            .get(&atom)
            .map_or(0, Vec::len)
    }

    /// Drop the stored state and graph node of an atom.
    ///
    /// Atoms with live listeners are kept; returns whether anything was
    /// removed. A forgotten primitive reads its initial state again, and
    /// derived atoms that read it recompute on their next read.
    pub fn forget(&self, atom: AtomId) -> bool {
        if self.listener_count(atom) > 0 {
            return false;
        }

        let had_value = self.inner.values.write().remove(&atom).is_some();
        let had_node = self.inner.graph.write().remove_node(atom);
        if had_value || had_node {
            tracing::trace!(store = self.inner.id, atom = %atom, "forgot atom");
        }
        had_value || had_node
    }

    /// Notify listeners of a written atom and its affected dependents.
    fn notify(&self, changed: AtomId, affected: Vec<AtomId>) -> Result<()> {
        let round: Vec<(AtomId, Subscriber)> = {
            let listeners = self.inner.listeners.read();
            std::iter::once(changed)
                .chain(affected)
                .flat_map(|id| {
                    listeners
                        .get(&id)
                        .into_iter()
                        .flatten()
                        .map(move |s| (id, s.clone()))
                })
                .collect()
        };

        if round.is_empty() {
            return Ok(());
        }
        tracing::trace!(store = self.inner.id, atom = %changed, listeners = round.len(), "notifying");

        let mut first_error = None;
        for (atom, subscriber) in round {
            // An earlier listener may have torn this one down
            if !self.inner.is_subscribed(atom, subscriber.id()) {
                continue;
            }
            if let Err(err) = subscriber.notify() {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::error!(store = self.inner.id, atom = %atom, error = %err, "listener failed");
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("values", &self.inner.values.read().len())
            .field("graph_nodes", &self.inner.graph.read().node_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, AtomicUsize};

    #[test]
    fn primitive_reads_initial_then_written() {
        let store = Store::new();
        let count = Atom::new(1);

        assert_eq!(store.read(&count).unwrap(), AtomState::Resolved(1));

        store.set(&count, 5).unwrap();
        assert_eq!(store.read(&count).unwrap(), AtomState::Resolved(5));

        store.update(&count, |v| v.copied().unwrap_or(0) * 2).unwrap();
        assert_eq!(store.read(&count).unwrap(), AtomState::Resolved(10));
    }

    #[test]
    fn stores_are_independent() {
        let a = Store::new();
        let b = Store::new();
        let count = Atom::new(0);

        a.set(&count, 3).unwrap();
        assert_eq!(a.read(&count).unwrap(), AtomState::Resolved(3));
        assert_eq!(b.read(&count).unwrap(), AtomState::Resolved(0));
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn derived_caches_until_input_changes() {
        let store = Store::new();
        let runs = Arc::new(AtomicI32::new(0));

        let base = Atom::new(2);
        let doubled = Atom::derived({
            let base = base.clone();
            let runs = runs.clone();
            move |get| {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(get.get(&base)? * 2)
            }
        });

        assert_eq!(store.read(&doubled).unwrap(), AtomState::Resolved(4));
        assert_eq!(store.read(&doubled).unwrap(), AtomState::Resolved(4));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        store.set(&base, 5).unwrap();
        assert_eq!(store.read(&doubled).unwrap(), AtomState::Resolved(10));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn derived_is_read_only() {
        let store = Store::new();
        let derived = Atom::derived(|_| Ok(1));

        let err = store.set(&derived, 2).unwrap_err();
        assert!(matches!(err, Error::ReadOnly(id) if id == derived.id()));
    }

    #[test]
    fn derived_inherits_pending_and_failure() {
        let store = Store::new();
        let source = Atom::<u32>::pending();
        let label = Atom::derived({
            let source = source.clone();
            move |get| Ok(format!("value {}", get.get(&source)?))
        });

        assert_eq!(store.read(&label).unwrap(), AtomState::Pending);

        store
            .set_state(&source, AtomState::Failed(AtomError::new("offline")))
            .unwrap();
        assert_eq!(
            store.read(&label).unwrap(),
            AtomState::Failed(AtomError::new("offline"))
        );

        store.set(&source, 9).unwrap();
        assert_eq!(
            store.read(&label).unwrap(),
            AtomState::Resolved("value 9".to_string())
        );
    }

    #[test]
    fn listeners_fire_for_dependents() {
        let store = Store::new();
        let base = Atom::new(1);
        let derived = Atom::derived({
            let base = base.clone();
            move |get| Ok(get.get(&base)? + 1)
        });
        // Wire the graph
        store.read(&derived).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let _sub = store.subscribe(derived.id(), {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        store.set(&base, 2).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = Store::new();
        let count = Atom::new(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = store.subscribe(count.id(), {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        assert_eq!(store.listener_count(count.id()), 1);

        store.set(&count, 1).unwrap();
        sub.unsubscribe();
        store.set(&count, 2).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(count.id()), 0);
    }

    #[test]
    fn first_listener_error_is_returned() {
        let store = Store::new();
        let count = Atom::new(0);
        let ran = Arc::new(AtomicUsize::new(0));

        let _failing = store.subscribe(count.id(), move || Err(Error::NoValue(AtomId::from(1))));
        let _after = store.subscribe(count.id(), {
            let ran = ran.clone();
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let err = store.set(&count, 1).unwrap_err();
        assert!(matches!(err, Error::NoValue(_)));
        // Later listeners still ran
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_removed_mid_round_is_skipped() {
        let store = Store::new();
        let count = Atom::new(0);
        let ran = Arc::new(AtomicUsize::new(0));
        let victim: Arc<parking_lot::Mutex<Option<Subscription>>> = Arc::default();

        let _killer = store.subscribe(count.id(), {
            let victim = victim.clone();
            move || {
                victim.lock().take();
                Ok(())
            }
        });
        *victim.lock() = Some(store.subscribe(count.id(), {
            let ran = ran.clone();
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        store.set(&count, 1).unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn forget_releases_atom_state() {
        let store = Store::new();
        let count = Atom::new(1);
        let doubled = Atom::derived({
            let count = count.clone();
            move |get| Ok(get.get(&count)? * 2)
        });

        store.set(&count, 4).unwrap();
        assert_eq!(store.read(&doubled).unwrap(), AtomState::Resolved(8));
        assert_eq!(store.inner.graph.read().node_count(), 2);

        assert!(store.forget(doubled.id()));
        assert!(!store.forget(doubled.id()));
        assert_eq!(store.inner.graph.read().node_count(), 1);
        assert_eq!(store.inner.values.read().len(), 1);

        // Recomputed from the current input
        assert_eq!(store.read(&doubled).unwrap(), AtomState::Resolved(8));

        assert!(store.forget(count.id()));
        assert_eq!(store.read(&count).unwrap(), AtomState::Resolved(1));
    }

    #[test]
    fn forget_keeps_subscribed_atoms() {
        let store = Store::new();
        let count = Atom::new(1);
        store.set(&count, 2).unwrap();

        let _sub = store.subscribe(count.id(), || Ok(()));
        assert!(!store.forget(count.id()));
        assert_eq!(store.read(&count).unwrap(), AtomState::Resolved(2));
    }

    #[tokio::test]
    async fn load_resolves_pending_atom() {
        let store = Store::new();
        let user = Atom::new(String::new());

        let (tx, rx) = tokio::sync::oneshot::channel::<String>();
        let task = store
            .load(&user, async move { rx.await.map_err(|e| AtomError::new(e.to_string())) })
            .unwrap();

        assert_eq!(store.read(&user).unwrap(), AtomState::Pending);

        tx.send("Ada".to_string()).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(
            store.read(&user).unwrap(),
            AtomState::Resolved("Ada".to_string())
        );
    }

    #[tokio::test]
    async fn load_records_failure() {
        let store = Store::new();
        let user = Atom::<String>::pending();

        let task = store
            .load(&user, async { Err(AtomError::new("404")) })
            .unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(
            store.read(&user).unwrap(),
            AtomState::Failed(AtomError::new("404"))
        );
    }
}
