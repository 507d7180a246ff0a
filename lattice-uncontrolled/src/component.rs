//! Uncontrolled Components
//!
//! An uncontrolled component renders a DOM tag once with its static props
//! and lets a binder keep the atom-valued props in sync afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! let x = Atom::new(100);
//!
//! let vnode = uncontrolled("div").render(
//!     Props::new()
//!         .class_name("box")
//!         .style("position", "relative")
//!         .style("left", &x),
//! );
//! let element = host::mount(&vnode)?;
//!
//! store.set(&x, 120)?; // element's `left` style becomes "120px"
//! ```
//!
//! # Component Cache
//!
//! Components are memoized per tag: asking twice for `"div"` yields the same
//! component. The process-wide cache behind `uncontrolled` lives for the
//! whole process; `reset_components` empties it.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::binder::{Binder, Bindings};
use crate::config::Config;
use crate::dom::VNode;
use crate::props::{keys, sanitize_map, Prop, PropMap};
use crate::store::{scope, Scope, Store};

/// Props for an uncontrolled component.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: PropMap,
    scope: Option<Scope>,
    store: Option<Store>,
    pending: Option<String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any prop.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Prop>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Text content; an atom here drives the node's text.
    pub fn children(self, value: impl Into<Prop>) -> Self {
        self.set(keys::CHILDREN, value)
    }

    pub fn class_name(self, value: impl Into<Prop>) -> Self {
        self.set(keys::CLASS_NAME, value)
    }

    /// Set one entry of the nested `style` map.
    pub fn style(mut self, name: impl Into<String>, value: impl Into<Prop>) -> Self {
        let style = self
            .entries
            .entry(keys::STYLE.to_string())
            .or_insert_with(|| Prop::Map(Arc::default()));

        if !matches!(style, Prop::Map(_)) {
            *style = Prop::Map(Arc::default());
        }
        if let Prop::Map(entries) = style {
            Arc::make_mut(entries).insert(name.into(), value.into());
        }
        self
    }

    /// Placeholder text while the `children` atom is pending.
    pub fn pending(mut self, text: impl Into<String>) -> Self {
        self.pending = Some(text.into());
        self
    }

    /// Read atoms from the store of this scope.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Read atoms from this store. Takes precedence over `scope`.
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.entries.get(key)
    }
}

/// A component for one DOM tag.
#[derive(Debug)]
pub struct UncontrolledComponent {
    tag: Arc<str>,
    config: Arc<Config>,
}

impl UncontrolledComponent {
    pub fn new(tag: impl Into<Arc<str>>, config: Arc<Config>) -> Self {
        Self {
            tag: tag.into(),
            config,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Render the component: static props go into the node, atoms into its
    /// binder.
    pub fn render(&self, props: Props) -> VNode {
        let Props {
            entries,
            scope,
            store,
            pending,
        } = props;

        let entries = Arc::new(entries);
        let static_props = sanitize_map(&entries);
        let bindings = collect_bindings(&entries);

        let store = store.unwrap_or_else(|| scope::store_for(scope.as_ref()));
        let pending = pending.or_else(|| self.config.pending_text.clone());

        let node_ref = Binder::new(store, bindings, pending, Arc::clone(&self.config));
        VNode::new(
            Arc::clone(&self.tag),
            static_props,
            Some(Arc::new(node_ref)),
            Arc::clone(&self.config),
        )
    }
}

/// Split atom-valued props into binder facets.
fn collect_bindings(entries: &PropMap) -> Bindings {
    let mut bindings = Bindings::default();

    for (key, value) in entries {
        match (key.as_str(), value) {
            (keys::CHILDREN, Prop::Atom(atom)) => bindings.text = Some(Arc::clone(atom)),
            (keys::CLASS_NAME, Prop::Atom(atom)) => bindings.class_name = Some(Arc::clone(atom)),
            (keys::STYLE, Prop::Atom(atom)) => {
                tracing::warn!(atom = %atom.id(), "a whole style map cannot be bound; bind its entries instead");
            }
            (keys::STYLE, Prop::Map(style)) => {
                for (name, value) in style.iter() {
                    if let Prop::Atom(atom) = value {
                        bindings.style.push((name.clone(), Arc::clone(atom)));
                    }
                }
            }
            (_, Prop::Atom(atom)) => bindings.attributes.push((key.clone(), Arc::clone(atom))),
            _ => {}
        }
    }

    bindings
}

/// Memoizing tag -> component map.
#[derive(Debug)]
pub struct Uncontrolled {
    components: DashMap<Arc<str>, Arc<UncontrolledComponent>>,
    config: Arc<Config>,
}

impl Uncontrolled {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            components: DashMap::new(),
            config: Arc::new(config),
        }
    }

    /// The process-wide factory used by `uncontrolled`.
    pub fn global() -> &'static Uncontrolled {
        static GLOBAL: OnceLock<Uncontrolled> = OnceLock::new();
        GLOBAL.get_or_init(Uncontrolled::new)
    }

    /// Get the component for a tag, creating it on first use.
    pub fn get(&self, tag: &str) -> Arc<UncontrolledComponent> {
        if let Some(component) = self.components.get(tag) {
            return Arc::clone(component.value());
        }

        let component = self
            .components
            .entry(Arc::from(tag))
            .or_insert_with(|| {
                tracing::debug!(tag, "creating uncontrolled component");
                Arc::new(UncontrolledComponent::new(tag, Arc::clone(&self.config)))
            });
        Arc::clone(component.value())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of cached components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Drop every cached component.
    pub fn reset(&self) {
        self.components.clear();
    }
}

impl Default for Uncontrolled {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the component for a tag from the process-wide factory.
pub fn uncontrolled(tag: &str) -> Arc<UncontrolledComponent> {
    Uncontrolled::global().get(tag)
}

/// Empty the process-wide component cache.
pub fn reset_components() {
    Uncontrolled::global().reset();
}
