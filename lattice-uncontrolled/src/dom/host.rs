//! Minimal Host
//!
//! Stands in for a renderer: turns a `VNode` into an `Element`, writes the
//! static props once, and drives the node's binder through mount and
//! unmount.

use std::sync::Arc;

use crate::binder::Binder;
use crate::config::Config;
use crate::error::Result;
use crate::props::{keys, Displayable, Prop, PropMap};

use super::element::{Element, Target};

/// Output of rendering an uncontrolled component.
#[derive(Debug, Clone)]
pub struct VNode {
    tag: Arc<str>,
    props: Arc<PropMap>,
    node_ref: Option<Arc<Binder>>,
    config: Arc<Config>,
}

impl VNode {
    pub fn new(
        tag: Arc<str>,
        props: Arc<PropMap>,
        node_ref: Option<Arc<Binder>>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            tag,
            props,
            node_ref,
            config,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The static (atom-free) props.
    pub fn props(&self) -> &Arc<PropMap> {
        &self.props
    }

    /// The lifecycle callback, if any.
    pub fn node_ref(&self) -> Option<&Arc<Binder>> {
        self.node_ref.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Create an element for the node and attach its binder.
pub fn mount(vnode: &VNode) -> Result<Element> {
    let element = Element::new(Arc::clone(&vnode.tag));
    apply_static(&element, &vnode.props, &vnode.config);

    if let Some(binder) = &vnode.node_ref {
        binder.attach(Some(&element))?;
    }
    Ok(element)
}

/// Detach the node's binder.
pub fn unmount(vnode: &VNode) {
    if let Some(binder) = &vnode.node_ref {
        binder.detach();
    }
}

/// Write static props into a node. Nested containers other than `style` and
/// `children` lists have no DOM counterpart and are skipped.
pub fn apply_static<N: Target>(node: &N, props: &PropMap, config: &Config) {
    for (key, value) in props {
        match key.as_str() {
            keys::CHILDREN => {
                if let Some(text) = static_text(value) {
                    node.set_text_content(&text);
                }
            }
            keys::CLASS_NAME => {
                if let Prop::Scalar(class_name) = value {
                    node.set_class_name(&class_name.to_string());
                }
            }
            keys::STYLE => {
                for (name, value) in value.as_map().into_iter().flatten() {
                    if let Prop::Scalar(value) = value {
                        node.set_style_property(name, &config.style_value(value));
                    }
                }
            }
            _ => match value {
                Prop::Scalar(Displayable::Text(text)) if node.supports_attributes() => {
                    node.set_attribute(key, text)
                }
                Prop::Scalar(value) => node.set_property(key, value.clone()),
                _ => {}
            },
        }
    }
}

fn static_text(children: &Prop) -> Option<String> {
    match children {
        Prop::Scalar(value) => Some(value.to_string()),
        Prop::List(items) => Some(
            items
                .iter()
                .filter_map(Prop::as_scalar)
                .map(ToString::to_string)
                .collect(),
        ),
        _ => None,
    }
}
