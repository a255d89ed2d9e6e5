// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change feed types.

use core::error::Error;
use core::fmt;

/// The kind of event carried by a [`Notification`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Items were inserted.
    Add,
    /// Existing items were replaced.
    Update,
    /// Items were removed.
    Remove,
    /// The read view may have changed; emitted after every other mutation event.
    Change,
    /// A mutation failed, or an owner reported a foreign error.
    Error,
    /// The loading flag flipped.
    Loading,
}

/// Payload of a [`Notification`].
pub enum EventData<'a, T> {
    /// Items affected by an `Add` or `Update`, in batch order.
    Items(&'a [&'a T]),
    /// Ids removed by a `Remove`.
    Ids(&'a [String]),
    /// Error carried by an `Error` event.
    Error(&'a (dyn Error + 'static)),
    /// New value of the loading flag.
    Loading(bool),
    /// No payload (`Change`).
    None,
}

impl<T: fmt::Debug> fmt::Debug for EventData<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            Self::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
            Self::Error(err) => f.debug_tuple("Error").field(&format_args!("{err}")).finish(),
            Self::Loading(loading) => f.debug_tuple("Loading").field(loading).finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// One event delivered to observers: `{ event, data }`.
#[derive(Debug)]
pub struct Notification<'a, T> {
    /// What happened.
    pub event: EventKind,
    /// Event payload.
    pub data: EventData<'a, T>,
}

/// Handle returned by [`Collection::subscribe`](crate::Collection::subscribe).
///
/// Pass it to [`Collection::unsubscribe`](crate::Collection::unsubscribe) to
/// stop receiving notifications. Dropping the handle does not unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(pub(crate) u64);

pub(crate) type Observer<T> = Box<dyn FnMut(&Notification<'_, T>)>;

/// Delivers `notification` to every observer in registration order.
pub(crate) fn emit<T>(observers: &mut [(Subscription, Observer<T>)], notification: &Notification<'_, T>) {
    for (_, observer) in observers.iter_mut() {
        observer(notification);
    }
}
