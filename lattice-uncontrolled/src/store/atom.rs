//! Atom Implementation
//!
//! An Atom is a handle to a piece of state whose value lives in a `Store`.
//! The handle itself only carries an identity and a recipe: either an initial
//! value (primitive atom) or a read function over other atoms (derived atom).
//!
//! # How Atoms Work
//!
//! 1. A primitive atom reads as its initial state until a store writes it.
//!
//! 2. A derived atom runs its read function against a `Getter`. Every atom
//!    the function reads through the getter becomes a dependency.
//!
//! 3. The store caches derived results and recomputes them only after one of
//!    their dependencies is written.
//!
//! # Short-Circuiting
//!
//! `Getter::get` returns `Err(Interrupt)` when a dependency is pending or
//! failed, so read functions can use `?` and the derived atom inherits the
//! dependency's state.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::AtomError;

use super::runtime::Store;
use super::state::AtomState;

/// Counter for generating unique atom IDs.
static ATOM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u64);

impl AtomId {
    fn next() -> Self {
        Self(ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for AtomId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether an atom owns its value or derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// Holds a value written through the store.
    Primitive,

    /// Computes its value from other atoms.
    Derived,
}

/// Why a derived read stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// A dependency is still pending.
    Pending,

    /// A dependency failed, or the read function reported a failure.
    Failed(AtomError),
}

impl From<AtomError> for Interrupt {
    fn from(err: AtomError) -> Self {
        Self::Failed(err)
    }
}

/// Result of a derived read function.
pub type ReadResult<T> = Result<T, Interrupt>;

pub(crate) type ReadFn<T> = dyn Fn(&Getter<'_>) -> ReadResult<T> + Send + Sync;

pub(crate) enum Source<T> {
    Primitive(AtomState<T>),
    Derived(Box<ReadFn<T>>),
}

/// A handle to a reactive value stored in a `Store`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Atom::new(1);
/// let label = Atom::derived({
///     let count = count.clone();
///     move |get| Ok(format!("Count: {}", get.get(&count)?))
/// });
///
/// let store = Store::new();
/// store.set(&count, 2)?;
/// assert_eq!(store.read(&label)?.value().unwrap(), "Count: 2");
/// ```
pub struct Atom<T> {
    id: AtomId,
    source: Arc<Source<T>>,
    label: Option<Arc<str>>,
}

impl<T> Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a primitive atom with an initial value.
    pub fn new(value: T) -> Self {
        Self::with_state(AtomState::Resolved(value))
    }

    /// Create a primitive atom that starts out pending.
    ///
    /// Readers see `AtomState::Pending` until a store writes a value, usually
    /// through `Store::load`.
    pub fn pending() -> Self {
        Self::with_state(AtomState::Pending)
    }

    fn with_state(state: AtomState<T>) -> Self {
        Self {
            id: AtomId::next(),
            source: Arc::new(Source::Primitive(state)),
            label: None,
        }
    }

    /// Create a derived atom from a read function.
    pub fn derived<F>(read: F) -> Self
    where
        F: Fn(&Getter<'_>) -> ReadResult<T> + Send + Sync + 'static,
    {
        Self {
            id: AtomId::next(),
            source: Arc::new(Source::Derived(Box::new(read))),
            label: None,
        }
    }

    /// Attach a debug label, shown in logs.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<T> Atom<T> {
    /// Get the atom's unique ID.
    pub fn id(&self) -> AtomId {
        self.id
    }

    /// Get the debug label, if one was set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Check whether this atom is primitive or derived.
    pub fn kind(&self) -> AtomKind {
        match *self.source {
            Source::Primitive(_) => AtomKind::Primitive,
            Source::Derived(_) => AtomKind::Derived,
        }
    }

    pub(crate) fn source(&self) -> &Source<T> {
        &self.source
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            source: Arc::clone(&self.source),
            label: self.label.clone(),
        }
    }
}

impl<T> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("label", &self.label)
            .finish()
    }
}

/// Read access handed to a derived atom's read function.
///
/// Records every atom read through it so the store can wire the dependency
/// graph after the read function returns.
pub struct Getter<'a> {
    store: &'a Store,
    dependencies: RefCell<Vec<(AtomId, AtomKind)>>,
}

impl<'a> Getter<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self {
            store,
            dependencies: RefCell::new(Vec::new()),
        }
    }

    /// Read another atom's resolved value.
    pub fn get<U>(&self, atom: &Atom<U>) -> ReadResult<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.dependencies.borrow_mut().push((atom.id(), atom.kind()));

        match self.store.read(atom) {
            Ok(AtomState::Resolved(value)) => Ok(value),
            Ok(AtomState::Pending) => Err(Interrupt::Pending),
            Ok(AtomState::Failed(err)) => Err(Interrupt::Failed(err)),
            Err(err) => Err(Interrupt::Failed(AtomError::new(err.to_string()))),
        }
    }

    pub(crate) fn into_dependencies(self) -> Vec<(AtomId, AtomKind)> {
        self.dependencies.into_inner()
    }
}
