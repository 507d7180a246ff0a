//! Property Trees and Sanitizing
//!
//! Props handed to an uncontrolled component are a mix of static values and
//! atoms. The static part goes to the renderer once; the atoms go to the
//! binder, which keeps the node in sync without re-rendering.

mod sanitize;
mod value;

pub use sanitize::{contains_atoms, sanitize, sanitize_map};
pub use value::{AtomRef, Displayable, IntoAtomRef, Prop, PropMap, ReadAtom};

/// Keys the binder treats specially.
pub mod keys {
    /// Text content of the node.
    pub const CHILDREN: &str = "children";
    /// Class name of the node.
    pub const CLASS_NAME: &str = "className";
    /// Map of style properties.
    pub const STYLE: &str = "style";
}
