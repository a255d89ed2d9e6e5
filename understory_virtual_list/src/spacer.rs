// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spacer extent tracking for partially loaded strips.
//!
//! A virtualized surface only materializes a handful of rows, but the
//! scrollbar should reflect the full dataset. Hosts size an invisible spacer to
//! [`SpacerExtent::extent`]:
//!
//! - When the data source reports a total count, the extent is set exactly
//!   with [`SpacerExtent::set_exact`] and stays clean.
//! - Otherwise the extent is a placeholder derived from the loaded count. Loads
//!   call [`SpacerExtent::mark_dirty`], and the next visibility pass calls
//!   [`SpacerExtent::resolve`] to recompute it lazily.
//!
//! Neither kind of extent shrinks below the bottom edge of the viewport. Doing
//! so would clamp the host's scroll offset and make the content jump.
//!
//! ```rust
//! use understory_virtual_list::{ExtentSource, SpacerExtent};
//!
//! let mut spacer = SpacerExtent::new();
//! spacer.mark_dirty();
//! // 30 rows of 40px loaded, viewport bottom at 600px.
//! assert_eq!(spacer.resolve(30, 40.0, 600.0), 1_200.0);
//! assert_eq!(spacer.source(), ExtentSource::Estimated);
//!
//! // The server reports 500 items in total.
//! spacer.set_exact(500, 40.0, 600.0);
//! assert_eq!(spacer.extent(), 20_000.0);
//! assert!(!spacer.is_dirty());
//! ```

/// Where the current spacer extent came from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExtentSource {
    /// Nothing has been computed yet.
    #[default]
    Unknown,
    /// Derived from the loaded item count; may grow as more items load.
    Estimated,
    /// Derived from a total reported by the data source.
    Exact,
}

/// Logical content extent for a scroll spacer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpacerExtent {
    extent: f64,
    source: ExtentSource,
    dirty: bool,
    held: bool,
}

impl SpacerExtent {
    /// Creates an unknown, clean, zero extent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extent: 0.0,
            source: ExtentSource::Unknown,
            dirty: false,
            held: false,
        }
    }

    /// Current extent.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Where the current extent came from.
    #[must_use]
    pub fn source(&self) -> ExtentSource {
        self.source
    }

    /// Returns `true` if the next [`SpacerExtent::resolve`] will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if the extent is being kept above a smaller computed
    /// value because the viewport reaches past it.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Sets the extent from a known total item count and marks it clean.
    ///
    /// A total that would end above `viewport_bottom` while the current
    /// extent reaches past it keeps the current extent until the viewport
    /// moves back up.
    pub fn set_exact(&mut self, total_count: usize, item_extent: f64, viewport_bottom: f64) {
        let exact = total_count as f64 * item_extent.max(0.0);
        self.held = Self::holds(exact, self.extent, viewport_bottom);
        if !self.held {
            self.extent = exact;
        }
        self.source = ExtentSource::Exact;
        self.dirty = false;
    }

    /// Marks a placeholder extent for lazy recomputation.
    ///
    /// Exact extents are authoritative and are left clean.
    pub fn mark_dirty(&mut self) {
        if self.source != ExtentSource::Exact {
            self.dirty = true;
        }
    }

    /// Drops an exact total so the next load can re-estimate from scratch.
    pub fn invalidate(&mut self) {
        self.source = ExtentSource::Unknown;
        self.dirty = true;
    }

    /// Recomputes a dirty placeholder and returns the current extent.
    ///
    /// The placeholder is `loaded_count * item_extent`. If that is smaller
    /// than the current extent while `viewport_bottom` lies past it, the
    /// current extent is kept: shrinking would pull the scroll offset back.
    pub fn resolve(&mut self, loaded_count: usize, item_extent: f64, viewport_bottom: f64) -> f64 {
        if !self.dirty {
            return self.extent;
        }
        self.dirty = false;
        let estimate = loaded_count as f64 * item_extent.max(0.0);
        self.held = Self::holds(estimate, self.extent, viewport_bottom);
        if !self.held {
            self.extent = estimate;
        }
        self.source = ExtentSource::Estimated;
        self.extent
    }

    fn holds(next: f64, current: f64, viewport_bottom: f64) -> bool {
        next < current && viewport_bottom > next
    }

    /// Resets to the initial unknown state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
