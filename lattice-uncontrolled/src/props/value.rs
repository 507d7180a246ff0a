//! Property Trees
//!
//! Component properties are a tree of ordered maps and lists whose leaves are
//! displayable scalars or atoms. Containers sit behind `Arc`, so cloning a
//! tree is cheap and "the same subtree" can be checked by pointer.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, Serializer};
use serde::Deserialize;

use crate::error::Result;
use crate::store::{Atom, AtomId, AtomState, Store};

/// A value that can be written into a node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum Displayable {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Displayable {
    /// Identity comparison with `Object.is` semantics for numbers.
    ///
    /// `NaN` is the same as `NaN`; `0` is not the same as `-0`.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (a, b) => a == b,
        }
    }

    /// Get the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Displayable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if *n == 0.0 => f.write_str("0"),
            Self::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Self::Number(n) if n.abs() >= 1e21 || n.abs() < 1e-6 => {
                // Exponent form, with an explicit sign on the exponent
                let formatted = format!("{n:e}");
                match formatted.split_once('e') {
                    Some((mantissa, exp)) if !exp.starts_with('-') => {
                        write!(f, "{mantissa}e+{exp}")
                    }
                    _ => f.write_str(&formatted),
                }
            }
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! displayable_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Displayable {
                fn from(value: $t) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

displayable_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<bool> for Displayable {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for Displayable {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Displayable {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// An atom seen through the lens of a property tree.
///
/// Every value the atom produces is coerced to a `Displayable`.
pub trait ReadAtom: Send + Sync {
    /// The atom's identity.
    fn id(&self) -> AtomId;

    /// Read the atom from a store, coercing the resolved value.
    fn read_displayable(&self, store: &Store) -> Result<AtomState<Displayable>>;
}

impl<T> ReadAtom for Atom<T>
where
    T: Clone + Into<Displayable> + Send + Sync + 'static,
{
    fn id(&self) -> AtomId {
        Atom::id(self)
    }

    fn read_displayable(&self, store: &Store) -> Result<AtomState<Displayable>> {
        Ok(store.read(self)?.map(Into::into))
    }
}

/// Shared, type-erased atom reference.
pub type AtomRef = Arc<dyn ReadAtom>;

/// Conversion into a type-erased atom reference.
pub trait IntoAtomRef {
    fn into_atom_ref(self) -> AtomRef;
}

impl<T> IntoAtomRef for Atom<T>
where
    T: Clone + Into<Displayable> + Send + Sync + 'static,
{
    fn into_atom_ref(self) -> AtomRef {
        Arc::new(self)
    }
}

impl<T> IntoAtomRef for &Atom<T>
where
    T: Clone + Into<Displayable> + Send + Sync + 'static,
{
    fn into_atom_ref(self) -> AtomRef {
        Arc::new(self.clone())
    }
}

impl IntoAtomRef for AtomRef {
    fn into_atom_ref(self) -> AtomRef {
        self
    }
}

/// Ordered string-keyed properties.
pub type PropMap = IndexMap<String, Prop>;

/// A node in a property tree.
#[derive(Clone)]
pub enum Prop {
    Null,
    Scalar(Displayable),
    List(Arc<Vec<Prop>>),
    Map(Arc<PropMap>),
    Atom(AtomRef),
}

impl Prop {
    /// Build a list from anything convertible into props.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Prop>,
    {
        Self::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Prop>,
    {
        Self::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Identity comparison.
    ///
    /// Containers are the same when they share an allocation, atoms when they
    /// share an ID, scalars when `Displayable::same` says so.
    pub fn same(&self, other: &Prop) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a.same(b),
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Atom(a), Self::Atom(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&AtomRef> {
        match self {
            Self::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Displayable> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Prop]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropMap> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key if this is a map.
    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.as_map().and_then(|entries| entries.get(key))
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Scalar(value) => fmt::Debug::fmt(value, f),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Self::Atom(atom) => write!(f, "Atom({})", atom.id()),
        }
    }
}

impl Serialize for Prop {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(value) => value.serialize(serializer),
            Self::List(items) => serializer.collect_seq(items.iter()),
            Self::Map(entries) => serializer.collect_map(entries.iter()),
            Self::Atom(atom) => Err(S::Error::custom(format!(
                "atom {} cannot be serialized; sanitize the tree first",
                atom.id()
            ))),
        }
    }
}

impl From<Displayable> for Prop {
    fn from(value: Displayable) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! prop_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Prop {
                fn from(value: $t) -> Self {
                    Self::Scalar(value.into())
                }
            }
        )*
    };
}

prop_scalar!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, bool, String, &str);

impl<T> From<Atom<T>> for Prop
where
    T: Clone + Into<Displayable> + Send + Sync + 'static,
{
    fn from(atom: Atom<T>) -> Self {
        Self::Atom(Arc::new(atom))
    }
}

impl<T> From<&Atom<T>> for Prop
where
    T: Clone + Into<Displayable> + Send + Sync + 'static,
{
    fn from(atom: &Atom<T>) -> Self {
        Self::Atom(Arc::new(atom.clone()))
    }
}

impl From<AtomRef> for Prop {
    fn from(atom: AtomRef) -> Self {
        Self::Atom(atom)
    }
}

impl From<Vec<Prop>> for Prop {
    fn from(items: Vec<Prop>) -> Self {
        Self::List(Arc::new(items))
    }
}

impl From<PropMap> for Prop {
    fn from(entries: PropMap) -> Self {
        Self::Map(Arc::new(entries))
    }
}

impl From<serde_json::Value> for Prop {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => b.into(),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Into::into),
            Value::String(s) => s.into(),
            Value::Array(items) => Self::list(items.into_iter().map(Prop::from)),
            Value::Object(entries) => Self::map(entries.into_iter().map(|(k, v)| (k, Prop::from(v)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_print_like_the_browser() {
        assert_eq!(Displayable::from(5).to_string(), "5");
        assert_eq!(Displayable::from(2.5).to_string(), "2.5");
        assert_eq!(Displayable::from(-0.0).to_string(), "0");
        assert_eq!(Displayable::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Displayable::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Displayable::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Displayable::from(true).to_string(), "true");
        assert_eq!(Displayable::from("hi").to_string(), "hi");
    }

    #[test]
    fn extreme_numbers_use_exponent_form() {
        assert_eq!(Displayable::from(1e21).to_string(), "1e+21");
        assert_eq!(Displayable::from(-2.5e22).to_string(), "-2.5e+22");
        assert_eq!(Displayable::from(1e-7).to_string(), "1e-7");
        assert_eq!(Displayable::from(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Displayable::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Displayable::from(0.000001).to_string(), "0.000001");
    }

    #[test]
    fn same_follows_object_is() {
        let nan = Displayable::from(f64::NAN);
        assert!(nan.same(&nan.clone()));
        assert!(!Displayable::from(0.0).same(&Displayable::from(-0.0)));
        assert!(Displayable::from(3).same(&Displayable::from(3.0)));
        assert!(!Displayable::from("3").same(&Displayable::from(3)));
    }

    #[test]
    fn containers_compare_by_pointer() {
        let a = Prop::list([1, 2]);
        let b = Prop::list([1, 2]);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn atoms_compare_by_id() {
        let atom = Atom::new(1);
        assert!(Prop::from(&atom).same(&Prop::from(atom.clone())));
        assert!(!Prop::from(&atom).same(&Prop::from(Atom::new(1))));
    }

    #[test]
    fn serializes_plain_trees() {
        let tree = Prop::map([
            ("className", Prop::from("box")),
            ("style", Prop::map([("left", 10)])),
            ("items", Prop::list([Prop::from(1), Prop::Null])),
        ]);

        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!({ "className": "box", "style": { "left": 10.0 }, "items": [1.0, null] })
        );
    }

    #[test]
    fn refuses_to_serialize_atoms() {
        let tree = Prop::map([("left", Prop::from(Atom::new(1)))]);
        assert!(serde_json::to_value(&tree).is_err());
    }

    #[test]
    fn converts_from_json() {
        let prop = Prop::from(json!({ "a": [1, "two", true], "b": null }));
        let a = prop.get("a").and_then(Prop::as_list).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a[1].as_scalar(), Some(&Displayable::from("two")));
        assert!(matches!(prop.get("b"), Some(Prop::Null)));
    }

    #[test]
    fn atom_reads_as_displayable() {
        let store = Store::new();
        let atom: AtomRef = Arc::new(Atom::new(42u32));
        assert_eq!(
            atom.read_displayable(&store).unwrap(),
            AtomState::Resolved(Displayable::Number(42.0))
        );
    }
}
