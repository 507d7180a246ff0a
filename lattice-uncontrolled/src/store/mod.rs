//! Atom Store
//!
//! This module implements the state container the binder reads from: atoms,
//! stores, change subscriptions and scoped store lookup.
//!
//! # Concepts
//!
//! ## Atoms
//!
//! An Atom is a handle, not a value. A primitive atom carries an initial
//! state; a derived atom carries a read function over other atoms.
//!
//! ## Stores
//!
//! A Store holds the current state of every atom it has seen. Reads return a
//! tagged `AtomState`: pending, resolved or failed. Writes notify listeners
//! of the written atom and of every derived atom that reads it.
//!
//! ## Scopes
//!
//! A Scope names a store so that distant parts of an app can share one
//! without passing handles around.

mod atom;
mod graph;
mod runtime;
pub mod scope;
mod state;
mod subscriber;

pub use atom::{Atom, AtomId, AtomKind, Getter, Interrupt, ReadResult};
pub use graph::{AtomNode, DependencyGraph, DirtyState};
pub use runtime::{Store, Subscription};
pub use scope::Scope;
pub use state::AtomState;
pub use subscriber::{Listener, Subscriber, SubscriberId};
