//! Element Nodes
//!
//! The binder writes into anything implementing `Target`. `Element` is the
//! in-memory implementation used by the host and by tests; it records every
//! write so callers can check exactly which facets changed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::props::Displayable;

/// A node the binder can write into.
///
/// Methods take `&self`: nodes are handles with interior mutability.
pub trait Target: Send + Sync {
    fn set_text_content(&self, text: &str);

    fn set_class_name(&self, class_name: &str);

    fn set_style_property(&self, name: &str, value: &str);

    fn set_attribute(&self, name: &str, value: &str);

    fn set_property(&self, name: &str, value: Displayable);

    /// Whether text values should be written as attributes rather than
    /// properties.
    fn supports_attributes(&self) -> bool {
        true
    }
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Text(String),
    ClassName(String),
    Style { name: String, value: String },
    Attribute { name: String, value: String },
    Property { name: String, value: Displayable },
}

#[derive(Debug, Default)]
struct ElementData {
    text_content: String,
    class_name: String,
    style: IndexMap<String, String>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, Displayable>,
    mutations: Vec<Mutation>,
}

/// Counter for generating unique element IDs.
static ELEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An in-memory DOM-like element.
///
/// Cloning yields another handle to the same element.
#[derive(Debug, Clone)]
pub struct Element {
    id: u64,
    tag: Arc<str>,
    data: Arc<RwLock<ElementData>>,
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self {
            id: ELEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            tag: tag.into(),
            data: Arc::default(),
        }
    }

    /// Get the element's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text_content(&self) -> String {
        self.data.read().text_content.clone()
    }

    pub fn class_name(&self) -> String {
        self.data.read().class_name.clone()
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.data.read().style.get(name).cloned()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.data.read().attributes.get(name).cloned()
    }

    pub fn property(&self, name: &str) -> Option<Displayable> {
        self.data.read().properties.get(name).cloned()
    }

    /// All writes since creation or the last `take_mutations`.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.data.read().mutations.clone()
    }

    /// Drain the write log.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.data.write().mutations)
    }
}

impl Target for Element {
    fn set_text_content(&self, text: &str) {
        let mut data = self.data.write();
        data.text_content = text.to_string();
        data.mutations.push(Mutation::Text(text.to_string()));
    }

    fn set_class_name(&self, class_name: &str) {
        let mut data = self.data.write();
        data.class_name = class_name.to_string();
        data.mutations.push(Mutation::ClassName(class_name.to_string()));
    }

    fn set_style_property(&self, name: &str, value: &str) {
        let mut data = self.data.write();
        data.style.insert(name.to_string(), value.to_string());
        data.mutations.push(Mutation::Style {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut data = self.data.write();
        data.attributes.insert(name.to_string(), value.to_string());
        data.mutations.push(Mutation::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn set_property(&self, name: &str, value: Displayable) {
        let mut data = self.data.write();
        data.properties.insert(name.to_string(), value.clone());
        data.mutations.push(Mutation::Property {
            name: name.to_string(),
            value,
        });
    }
}
