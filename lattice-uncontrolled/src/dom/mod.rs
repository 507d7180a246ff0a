//! DOM-like nodes and a minimal host.

mod element;
pub mod host;

pub use element::{Element, Mutation, Target};
pub use host::{mount, unmount, VNode};
