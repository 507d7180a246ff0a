//! The tagged result of reading an atom.

use crate::error::AtomError;

/// What a store read reports for an atom.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomState<T> {
    /// The value is still being produced.
    Pending,

    /// The value is available.
    Resolved(T),

    /// Producing the value failed.
    Failed(AtomError),
}

impl<T> AtomState<T> {
    /// Check if the atom is still pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Get the resolved value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Convert the resolved value, keeping the pending and failed tags.
    pub fn map<U, F>(self, f: F) -> AtomState<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Pending => AtomState::Pending,
            Self::Resolved(value) => AtomState::Resolved(f(value)),
            Self::Failed(err) => AtomState::Failed(err),
        }
    }
}

impl<T> From<Result<T, AtomError>> for AtomState<T> {
    fn from(result: Result<T, AtomError>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(err) => Self::Failed(err),
        }
    }
}
