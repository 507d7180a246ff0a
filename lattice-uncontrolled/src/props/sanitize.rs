//! Atom Removal
//!
//! Strips atoms out of a property tree so that the rest can be handed to the
//! renderer as plain static props.
//!
//! # Rules
//!
//! - An atom leaf is dropped, not replaced with a placeholder.
//! - Map entries and list elements whose value is dropped disappear; later
//!   list elements shift down. No holes are left behind.
//! - Containers that lose every entry stay as empty containers.
//! - A container with nothing to drop is returned as the same `Arc`, so
//!   `Prop::same(input, output)` tells the caller no atoms were found.

use std::sync::Arc;

use super::value::{Prop, PropMap};

/// Outcome of pruning one node.
enum Pruned {
    /// Nothing changed; reuse the input.
    Keep,
    /// The node was an atom.
    Drop,
    /// Some descendant was dropped; this is the rebuilt node.
    Replace(Prop),
}

/// Remove every atom from a property tree.
///
/// Returns `None` if `prop` is itself an atom.
pub fn sanitize(prop: &Prop) -> Option<Prop> {
    match prune(prop) {
        Pruned::Keep => Some(prop.clone()),
        Pruned::Drop => None,
        Pruned::Replace(next) => Some(next),
    }
}

/// Remove every atom from a map of properties.
///
/// Returns the input map itself when it held no atoms.
pub fn sanitize_map(entries: &Arc<PropMap>) -> Arc<PropMap> {
    match prune_map(entries) {
        Some(pruned) => Arc::new(pruned),
        None => Arc::clone(entries),
    }
}

/// Check whether a tree holds any atom.
pub fn contains_atoms(prop: &Prop) -> bool {
    match prop {
        Prop::Atom(_) => true,
        Prop::List(items) => items.iter().any(contains_atoms),
        Prop::Map(entries) => entries.values().any(contains_atoms),
        Prop::Null | Prop::Scalar(_) => false,
    }
}

fn prune(prop: &Prop) -> Pruned {
    match prop {
        Prop::Atom(_) => Pruned::Drop,
        Prop::List(items) => match prune_list(items) {
            Some(pruned) => Pruned::Replace(Prop::List(Arc::new(pruned))),
            None => Pruned::Keep,
        },
        Prop::Map(entries) => match prune_map(entries) {
            Some(pruned) => Pruned::Replace(Prop::Map(Arc::new(pruned))),
            None => Pruned::Keep,
        },
        Prop::Null | Prop::Scalar(_) => Pruned::Keep,
    }
}

/// Returns `None` when the list is unchanged. The copy is only started at
/// the first element that changes.
fn prune_list(items: &[Prop]) -> Option<Vec<Prop>> {
    let mut out: Option<Vec<Prop>> = None;

    for (index, item) in items.iter().enumerate() {
        match prune(item) {
            Pruned::Keep => {
                if let Some(out) = out.as_mut() {
                    out.push(item.clone());
                }
            }
            Pruned::Drop => {
                out.get_or_insert_with(|| items[..index].to_vec());
            }
            Pruned::Replace(next) => {
                out.get_or_insert_with(|| items[..index].to_vec()).push(next);
            }
        }
    }

    out
}

fn prune_map(entries: &PropMap) -> Option<PropMap> {
    let mut out: Option<PropMap> = None;
    let head = |index: usize| -> PropMap {
        entries
            .iter()
            .take(index)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };

    for (index, (key, value)) in entries.iter().enumerate() {
        match prune(value) {
            Pruned::Keep => {
                if let Some(out) = out.as_mut() {
                    out.insert(key.clone(), value.clone());
                }
            }
            Pruned::Drop => {
                out.get_or_insert_with(|| head(index));
            }
            Pruned::Replace(next) => {
                out.get_or_insert_with(|| head(index)).insert(key.clone(), next);
            }
        }
    }

    out
}
