// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;
use understory_collection::CollectionError;
use understory_data_adapter::AdapterError;

/// Error returned by [`ListManager`](crate::ListManager) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ListError {
    /// The collection rejected a batch of loaded items.
    #[error(transparent)]
    Collection(#[from] CollectionError),
    /// A load the caller asked for failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    /// The operation needs [`initialize`](crate::ListManager::initialize) first.
    #[error("list is not initialized")]
    NotInitialized,
    /// The list has been torn down.
    #[error("list has been destroyed")]
    Destroyed,
    /// The list was built from static items and cannot load.
    #[error("list has a static source")]
    StaticSource,
    /// The pagination strategy cannot address a page or index directly.
    #[error("cursor pagination cannot jump to an arbitrary position")]
    Unaddressable,
}
