// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::range::{VisibleRange, compute_visible_range};

/// A strip of `len` items that all share the same extent.
///
/// This is the only layout model the list pipeline needs: rows are assumed to
/// be fixed-height, so offsets are a multiplication and index lookup is a
/// division.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedExtentModel {
    len: usize,
    extent: f64,
}

impl FixedExtentModel {
    /// Creates a model with `len` items of `extent` each.
    ///
    /// Non-finite or negative extents are treated as zero.
    #[must_use]
    pub fn new(len: usize, extent: f64) -> Self {
        Self {
            len,
            extent: sanitize(extent),
        }
    }

    /// Number of items in the strip.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the strip holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets the number of items.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    /// Per-item extent.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Sets the per-item extent.
    pub fn set_extent(&mut self, extent: f64) {
        self.extent = sanitize(extent);
    }

    /// Total extent of all items.
    #[must_use]
    pub fn total_extent(&self) -> f64 {
        self.extent * self.len as f64
    }

    /// Offset of the leading edge of `index`. Not clamped to `len`.
    #[must_use]
    pub fn offset_of(&self, index: usize) -> f64 {
        self.extent * index as f64
    }

    /// Index of the item containing `offset`, clamped to `0..len`.
    ///
    /// Returns `0` for empty strips or zero extents.
    #[must_use]
    pub fn index_at_offset(&self, offset: f64) -> usize {
        if self.len == 0 {
            return 0;
        }
        let range = compute_visible_range(offset, 0.0, self.extent, self.len, 0);
        range.start.min(self.len - 1)
    }

    /// Computes the visible range for a viewport over this strip.
    #[must_use]
    pub fn visible_range(
        &self,
        scroll_offset: f64,
        viewport_extent: f64,
        overscan: usize,
    ) -> VisibleRange {
        compute_visible_range(
            scroll_offset,
            viewport_extent,
            self.extent,
            self.len,
            overscan,
        )
    }

    /// Largest valid scroll offset for a viewport, `0` when content fits.
    #[must_use]
    pub fn max_scroll_offset(&self, viewport_extent: f64) -> f64 {
        (self.total_extent() - viewport_extent.max(0.0)).max(0.0)
    }
}

fn sanitize(extent: f64) -> f64 {
    if extent.is_finite() && extent > 0.0 {
        extent
    } else {
        0.0
    }
}
