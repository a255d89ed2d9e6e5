// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Error returned by collection mutations.
///
/// All variants describe caller bugs (malformed input or stale ids) and are
/// not worth retrying.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// An item had an empty id.
    #[error("item is missing an id")]
    MissingId,
    /// An `add` targeted an id that is already stored, or a batch repeated one.
    #[error("item with id {0:?} already exists")]
    DuplicateId(String),
    /// The configured validator rejected an item.
    #[error("item {id:?} failed validation")]
    Validation {
        /// Id of the rejected item.
        id: String,
    },
    /// An `update` or `remove` targeted an id that is not stored.
    #[error("no item with id {0:?}")]
    NotFound(String),
}

/// Coarse classification of a [`CollectionError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: missing id, duplicate id, or validator rejection.
    Validation,
    /// Reference to an unknown id.
    NotFound,
}

impl CollectionError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingId | Self::DuplicateId(_) | Self::Validation { .. } => {
                ErrorKind::Validation
            }
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
