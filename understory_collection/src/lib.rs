// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_collection --heading-base-level=0

//! Understory Collection: an observable store of uniquely keyed items.
//!
//! [`Collection`] owns items that implement [`Keyed`] (each has a non-empty
//! string id) and publishes every mutation to registered observers. It has no
//! knowledge of pagination or rendering; list controllers feed it and react to
//! its change feed.
//!
//! - **Mutation**: [`Collection::add`], [`Collection::update`],
//!   [`Collection::upsert`], [`Collection::replace`], [`Collection::remove`],
//!   [`Collection::clear`].
//!   Every batch is validated in full before anything is written, so a failed
//!   batch leaves the collection untouched.
//! - **Read view**: [`Collection::items`] applies the active filter
//!   ([`Collection::query`]) and comparator ([`Collection::sort`]) lazily on
//!   read. Stored order (insertion order) is never changed by a view.
//! - **Change feed**: [`Collection::subscribe`] registers an observer that
//!   receives a [`Notification`] for each [`EventKind`]. Errors, including
//!   foreign ones routed through [`Collection::report_error`], arrive on the
//!   same feed, so one subscriber can handle them all.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_collection::{Collection, EventKind, Keyed};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Row {
//!     id: String,
//!     score: u32,
//! }
//!
//! impl Keyed for Row {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! let row = |id: &str, score| Row { id: id.into(), score };
//!
//! let mut rows = Collection::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! rows.subscribe(move |n| sink.borrow_mut().push(n.event));
//!
//! rows.add([row("a", 3), row("b", 1)]).unwrap();
//! assert!(rows.add([row("a", 9)]).is_err());
//!
//! rows.sort(|a: &Row, b: &Row| a.score.cmp(&b.score));
//! let ids: Vec<&str> = rows.items().into_iter().map(Keyed::id).collect();
//! assert_eq!(ids, ["b", "a"]);
//!
//! assert!(seen.borrow().contains(&EventKind::Add));
//! assert!(seen.borrow().contains(&EventKind::Error));
//! ```

mod collection;
mod error;
mod event;

pub use collection::Collection;
pub use error::{CollectionError, ErrorKind};
pub use event::{EventData, EventKind, Notification, Subscription};

/// An item with a stable, unique string id.
///
/// The collection treats everything else about an item as opaque. Ids must be
/// non-empty; items with an empty id are rejected by every mutation.
pub trait Keyed {
    /// Returns the item's id.
    fn id(&self) -> &str;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
}
