//! Subscription Binder
//!
//! A Binder is the lifecycle callback of an uncontrolled node. Given a node it
//! subscribes every bound atom and writes each new value straight into the
//! node, bypassing the renderer.
//!
//! # Lifecycle
//!
//! 1. `attach(Some(node))` drops whatever the binder was subscribed to, then
//!    subscribes each binding and writes the current values.
//!
//! 2. On every change the affected binding re-reads its atom and writes the
//!    new value if it differs from the last one written.
//!
//! 3. `attach(None)` / `detach()` drops all subscriptions. Dropping the
//!    binder does the same.
//!
//! At most one set of subscriptions is alive per binder.
//!
//! # Facets
//!
//! | binding      | write                                                  |
//! |--------------|--------------------------------------------------------|
//! | `text`       | text content; pending shows the placeholder, if any   |
//! | `class_name` | class name                                             |
//! | `style`      | style property; bare numbers get the configured unit  |
//! | `attributes` | attribute for text values, property for anything else |

mod subscribe;

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::config::Config;
use crate::dom::Target;
use crate::error::Result;
use crate::props::{AtomRef, Displayable, IntoAtomRef};
use crate::store::{scope, Scope, Store, Subscription};

use subscribe::{bind_atom, Apply, OnPending};

/// The atoms a binder pushes into a node.
#[derive(Clone, Default)]
pub struct Bindings {
    pub text: Option<AtomRef>,
    pub class_name: Option<AtomRef>,
    pub style: Vec<(String, AtomRef)>,
    pub attributes: Vec<(String, AtomRef)>,
}

impl Bindings {
    /// Number of bound atoms.
    pub fn len(&self) -> usize {
        usize::from(self.text.is_some())
            + usize::from(self.class_name.is_some())
            + self.style.len()
            + self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = |entries: &[(String, AtomRef)]| {
            entries.iter().map(|(k, a)| format!("{k}={}", a.id())).collect::<Vec<_>>()
        };
        f.debug_struct("Bindings")
            .field("text", &self.text.as_ref().map(|a| a.id()))
            .field("class_name", &self.class_name.as_ref().map(|a| a.id()))
            .field("style", &keys(self.style.as_slice()))
            .field("attributes", &keys(self.attributes.as_slice()))
            .finish()
    }
}

/// Keeps one node in sync with a set of atoms.
pub struct Binder {
    store: Store,
    bindings: Bindings,
    pending_text: Option<String>,
    config: Arc<Config>,
    subscriptions: Mutex<SmallVec<[Subscription; 4]>>,
}

impl Binder {
    /// Create a binder reading from `store`.
    pub fn new(
        store: Store,
        bindings: Bindings,
        pending_text: Option<String>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            bindings,
            pending_text,
            config,
            subscriptions: Mutex::new(SmallVec::new()),
        }
    }

    /// The store the bindings read from.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Number of live subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Bind to a new node, or unbind with `None`.
    ///
    /// Previous subscriptions are always dropped first. If a binding fails on
    /// its first read, the bindings set up before it stay live until the next
    /// call and the failure is returned.
    pub fn attach<N>(&self, node: Option<&N>) -> Result<()>
    where
        N: Target + Clone + 'static,
    {
        self.release();

        let Some(node) = node else {
            return Ok(());
        };
        tracing::debug!(
            store = self.store.id(),
            bindings = self.bindings.len(),
            "attaching binder"
        );

        if let Some(atom) = &self.bindings.text {
            // Text always suspends, with or without a placeholder
            let on_pending: OnPending = match self.pending_text.clone() {
                Some(text) => {
                    let node = node.clone();
                    Box::new(move || node.set_text_content(&text))
                }
                None => Box::new(|| {}),
            };
            self.bind(atom, text_setter(node.clone()), Some(on_pending))?;
        }

        if let Some(atom) = &self.bindings.class_name {
            let node = node.clone();
            let apply: Apply = Box::new(move |v: &Displayable| node.set_class_name(&v.to_string()));
            self.bind(atom, apply, None)?;
        }

        for (name, atom) in &self.bindings.style {
            let apply = style_setter(node.clone(), name.clone(), Arc::clone(&self.config));
            self.bind(atom, apply, None)?;
        }

        for (name, atom) in &self.bindings.attributes {
            self.bind(atom, attribute_setter(node.clone(), name.clone()), None)?;
        }

        Ok(())
    }

    /// Drop every subscription.
    pub fn detach(&self) {
        self.release();
    }

    fn bind(&self, atom: &AtomRef, apply: Apply, on_pending: Option<OnPending>) -> Result<()> {
        let subscription = bind_atom(&self.store, Arc::clone(atom), apply, on_pending)?;
        self.subscriptions.lock().push(subscription);
        Ok(())
    }

    fn release(&self) {
        let released = std::mem::take(&mut *self.subscriptions.lock());
        if !released.is_empty() {
            tracing::debug!(store = self.store.id(), released = released.len(), "releasing binder subscriptions");
        }
        // Unsubscribe outside the lock
        drop(released);
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("store", &self.store.id())
            .field("bindings", &self.bindings)
            .field("pending_text", &self.pending_text)
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}

fn text_setter<N: Target + 'static>(node: N) -> Apply {
    Box::new(move |v: &Displayable| node.set_text_content(&v.to_string()))
}

fn style_setter<N: Target + 'static>(node: N, name: String, config: Arc<Config>) -> Apply {
    Box::new(move |v: &Displayable| node.set_style_property(&name, &config.style_value(v)))
}

fn attribute_setter<N: Target + 'static>(node: N, name: String) -> Apply {
    Box::new(move |v: &Displayable| match v {
        Displayable::Text(text) if node.supports_attributes() => node.set_attribute(&name, text),
        other => node.set_property(&name, other.clone()),
    })
}

/// Options for `register`.
#[derive(Default)]
pub struct RegisterOptions {
    bindings: Bindings,
    scope: Option<Scope>,
    store: Option<Store>,
    pending: Option<String>,
    config: Option<Arc<Config>>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the node's text content.
    pub fn text(mut self, atom: impl IntoAtomRef) -> Self {
        self.bindings.text = Some(atom.into_atom_ref());
        self
    }

    /// Bind the node's class name.
    pub fn class_name(mut self, atom: impl IntoAtomRef) -> Self {
        self.bindings.class_name = Some(atom.into_atom_ref());
        self
    }

    /// Bind one style property.
    pub fn style(mut self, name: impl Into<String>, atom: impl IntoAtomRef) -> Self {
        self.bindings.style.push((name.into(), atom.into_atom_ref()));
        self
    }

    /// Bind one attribute.
    pub fn attribute(mut self, name: impl Into<String>, atom: impl IntoAtomRef) -> Self {
        self.bindings.attributes.push((name.into(), atom.into_atom_ref()));
        self
    }

    /// Text shown while the text atom is pending.
    pub fn pending(mut self, text: impl Into<String>) -> Self {
        self.pending = Some(text.into());
        self
    }

    /// Read from the store of this scope.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Read from this store. Takes precedence over `scope`.
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: Arc<Config>) -> Self {
        self.config = Some(config);
        self
    }
}

/// Build a binder for a plain node, without the component factory.
///
/// ```rust,ignore
/// let left = Atom::new(0);
/// let binder = register(RegisterOptions::new().style("left", &left));
/// binder.attach(Some(&element))?;
/// ```
pub fn register(options: RegisterOptions) -> Binder {
    let RegisterOptions {
        bindings,
        scope,
        store,
        pending,
        config,
    } = options;

    let store = store.unwrap_or_else(|| scope::store_for(scope.as_ref()));
    let config = config.unwrap_or_default();
    let pending = pending.or_else(|| config.pending_text.clone());

    Binder::new(store, bindings, pending, config)
}
