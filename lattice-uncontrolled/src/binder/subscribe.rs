//! One atom, one facet.
//!
//! `bind_atom` subscribes to an atom and pushes each new resolved value into
//! a setter, skipping values that are the same as the last one applied.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::props::{AtomRef, Displayable};
use crate::store::{AtomState, Store, Subscription};

pub(crate) type Apply = Box<dyn Fn(&Displayable) + Send + Sync>;
pub(crate) type OnPending = Box<dyn Fn() + Send + Sync>;

/// Subscribe `apply` to an atom and run it once with the current state.
///
/// If the first read fails, the subscription is dropped and the failure is
/// returned.
pub(crate) fn bind_atom(
    store: &Store,
    atom: AtomRef,
    apply: Apply,
    on_pending: Option<OnPending>,
) -> Result<Subscription> {
    let atom_id = atom.id();
    // `None` means nothing applied yet, or a pending state reset it
    let last: Mutex<Option<Displayable>> = Mutex::new(None);

    let callback = Arc::new({
        let store = store.clone();
        move || -> Result<()> {
            match atom.read_displayable(&store)? {
                AtomState::Failed(source) => Err(Error::Atom {
                    atom: atom.id(),
                    source,
                }),
                AtomState::Pending => {
                    // Only suspending bindings forget what they last wrote
                    if let Some(on_pending) = &on_pending {
                        on_pending();
                        *last.lock() = None;
                    }
                    Ok(())
                }
                AtomState::Resolved(value) => {
                    let unchanged = last
                        .lock()
                        .as_ref()
                        .is_some_and(|prev| prev.same(&value));
                    if !unchanged {
                        tracing::trace!(atom = %atom.id(), value = %value, "applying atom value");
                        apply(&value);
                        *last.lock() = Some(value);
                    }
                    Ok(())
                }
            }
        }
    });

    let subscription = store.subscribe(atom_id, {
        let callback = Arc::clone(&callback);
        move || (*callback)()
    });
    (*callback)()?;
    Ok(subscription)
}
