//! Store Scopes
//!
//! A scope names a store. Components and binders pick their store by scope;
//! the unscoped store is the process-wide default.
//!
//! Stores are created lazily the first time a scope is asked for, so an app
//! that never provides one still works against the default store. `provide`
//! installs a specific store for a scope, `clear` forgets one and `reset`
//! forgets them all.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::runtime::Store;

/// Name of an atom store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(Arc<str>);

impl Scope {
    /// Create a scope with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Get the scope's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Stores keyed by scope; `None` is the default store.
static PROVIDERS: OnceLock<RwLock<HashMap<Option<Scope>, Store>>> = OnceLock::new();

fn get_providers() -> &'static RwLock<HashMap<Option<Scope>, Store>> {
    PROVIDERS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Get the store for a scope, creating it on first use.
pub fn store_for(scope: Option<&Scope>) -> Store {
    let key = scope.cloned();

    if let Some(store) = get_providers().read().get(&key) {
        return store.clone();
    }

    get_providers()
        .write()
        .entry(key)
        .or_insert_with(|| {
            tracing::debug!(scope = ?scope.map(Scope::name), "creating store for scope");
            Store::new()
        })
        .clone()
}

/// Get the default (unscoped) store.
pub fn default_store() -> Store {
    store_for(None)
}

/// Install a store for a scope, returning the store it replaces.
pub fn provide(scope: Option<Scope>, store: Store) -> Option<Store> {
    get_providers().write().insert(scope, store)
}

/// Forget the store of one scope. The next lookup creates a fresh one.
pub fn clear(scope: Option<&Scope>) -> Option<Store> {
    get_providers().write().remove(&scope.cloned())
}

/// Forget every provided store, the default store included.
pub fn reset() {
    get_providers().write().clear();
}
