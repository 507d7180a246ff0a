//! Lattice Uncontrolled
//!
//! This crate binds DOM-like nodes directly to atoms, so that a changing
//! value updates exactly one facet of one node without re-rendering the
//! component that owns it.
//! It implements:
//!
//! - An atom store with derived atoms, async loading and subscriptions
//! - A sanitizer that strips atoms out of property trees
//! - A binder that pushes atom values into text, class name, style and
//!   attributes of a node
//! - A factory of memoized per-tag uncontrolled components
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: Atoms, stores, subscriptions and named scopes
//! - `props`: Property trees and sanitizing
//! - `binder`: Atom to node bindings and the `register` entry point
//! - `dom`: An in-memory element and a minimal host that mounts nodes
//! - `component`: Uncontrolled components and the per-tag factory
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_uncontrolled::{host, uncontrolled, Atom, Props, Store};
//!
//! let store = Store::new();
//! let x = Atom::new(100);
//!
//! let vnode = uncontrolled("div").render(
//!     Props::new()
//!         .store(store.clone())
//!         .class_name("box")
//!         .style("left", &x),
//! );
//! let element = host::mount(&vnode)?;
//!
//! // Only the `left` style of the element is written
//! store.set(&x, 120)?;
//! ```

pub mod binder;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod props;
pub mod store;

pub use binder::{register, Binder, Bindings, RegisterOptions};
pub use component::{reset_components, uncontrolled, Props, Uncontrolled, UncontrolledComponent};
pub use config::Config;
pub use dom::{host, mount, unmount, Element, Mutation, Target, VNode};
pub use error::{AtomError, Error, Result};
pub use props::{sanitize, Displayable, Prop, PropMap};
pub use store::{Atom, AtomState, Interrupt, Scope, Store};
