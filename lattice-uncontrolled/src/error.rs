//! Error types shared by the store, the binder and the component factory.

use std::sync::Arc;

use crate::store::AtomId;

/// Failure payload carried by an atom in the failed state.
///
/// Cheap to clone so that every reader of the atom sees the same failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AtomError {
    message: Arc<str>,
}

impl AtomError {
    /// Create a new failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }

    /// Get the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced by this crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A bound atom resolved to its failed state.
    #[error("atom {atom} failed: {source}")]
    Atom {
        atom: AtomId,
        #[source]
        source: AtomError,
    },

    /// The store holds no usable state for the atom.
    #[error("no atom value for {0}")]
    NoValue(AtomId),

    /// A write was attempted on a derived atom.
    #[error("atom {0} is derived and cannot be written")]
    ReadOnly(AtomId),

    /// A configuration document could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
