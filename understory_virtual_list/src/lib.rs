// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_virtual_list --heading-base-level=0

//! Understory Virtual List: core 1D virtualization primitives.
//!
//! Range math, spacer sizing, and element recycling for a dense strip of
//! fixed-extent rows indexed `0..len`, with no opinion about how rows are
//! drawn.
//!
//! Pieces:
//!
//! - [`FixedExtentModel`]: a strip of `len` items that all share one extent
//!   (row height), with offset/index conversions.
//! - [`compute_visible_range`]: given a scroll offset, viewport extent, and an
//!   overscan margin, returns which indices are strictly visible and which should
//!   be realized.
//! - [`SpacerExtent`]: the logical content extent used to size a scroll spacer,
//!   either exact (from a known total) or a placeholder that is lazily recomputed
//!   and never shrinks under the viewport.
//! - [`ElementPool`]: recycles realized elements as indices leave and enter the
//!   realized range, instead of destroying and recreating them.
//!
//! Widgets, display trees, and data stay with the host, which:
//!
//! - Owns the items and the element type.
//! - Calling [`compute_visible_range`] when scroll or viewport changes.
//! - Binding recycled elements to new data in the [`ElementPool::sync`] callback.
//! - Sizing their spacer from [`SpacerExtent::resolve`].
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_virtual_list::FixedExtentModel;
//!
//! // 100 items, each 40 logical pixels tall.
//! let model = FixedExtentModel::new(100, 40.0);
//!
//! // 400px viewport scrolled to 800px, two rows of overscan.
//! let range = model.visible_range(800.0, 400.0, 2);
//! assert_eq!(range.visible(), 20..30);
//! assert_eq!(range.realized(), 18..32);
//! assert_eq!(model.total_extent(), 4_000.0);
//! ```
//!
//! Extents and offsets share one caller-chosen unit, usually logical pixels,
//! and should be finite and non-negative. The crate is `no_std` + `alloc`.

#![no_std]

extern crate alloc;

mod fixed;
mod pool;
mod range;
mod spacer;

pub use fixed::FixedExtentModel;
pub use pool::{ElementPool, PoolStats};
pub use range::{VisibleRange, compute_visible_range};
pub use spacer::{ExtentSource, SpacerExtent};
