// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible index range computation.

use core::ops::Range;

/// Result of a visibility query over a fixed-extent strip.
///
/// `start..end` are the indices intersecting the viewport. The realized
/// range additionally includes up to `overscan` indices on either side, which
/// hosts render ahead of time to mask load and layout latency.
///
/// All four indices are clamped to `0..=len` of the strip they were computed
/// for, and `realized_start <= start <= end <= realized_end`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    /// First strictly visible index.
    pub start: usize,
    /// One past the last strictly visible index.
    pub end: usize,
    /// First realized index (visible start minus overscan, clamped).
    pub realized_start: usize,
    /// One past the last realized index (visible end plus overscan, clamped).
    pub realized_end: usize,
}

impl VisibleRange {
    /// An empty range at index zero.
    pub const EMPTY: Self = Self {
        start: 0,
        end: 0,
        realized_start: 0,
        realized_end: 0,
    };

    /// Returns the strictly visible indices.
    #[must_use]
    pub fn visible(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the indices that should be realized, including overscan.
    #[must_use]
    pub fn realized(&self) -> Range<usize> {
        self.realized_start..self.realized_end
    }

    /// Returns `true` if nothing is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of strictly visible indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Maps a range computed over logical indices into a loaded window.
    ///
    /// `window_start` is the logical index of the window's first element and
    /// `window_len` its length. Indices are translated and clamped into
    /// `0..=window_len`; parts of the range outside the window are dropped.
    #[must_use]
    pub fn to_window(&self, window_start: usize, window_len: usize) -> Self {
        let map = |i: usize| i.saturating_sub(window_start).min(window_len);
        Self {
            start: map(self.start),
            end: map(self.end),
            realized_start: map(self.realized_start),
            realized_end: map(self.realized_end),
        }
    }
}

/// Computes the visible and realized index ranges for a fixed-extent strip.
///
/// - `start = floor(scroll_offset / item_extent)`
/// - `end = ceil((scroll_offset + viewport_extent) / item_extent)`
///
/// Both are clamped to `0..=len`, then padded by `overscan` indices on each
/// side for the realized range. Non-finite inputs, a non-positive item
/// extent, or an empty strip yield [`VisibleRange::EMPTY`]. Negative scroll
/// offsets (overscroll bounce) are treated as zero.
#[must_use]
pub fn compute_visible_range(
    scroll_offset: f64,
    viewport_extent: f64,
    item_extent: f64,
    len: usize,
    overscan: usize,
) -> VisibleRange {
    if len == 0
        || !scroll_offset.is_finite()
        || !viewport_extent.is_finite()
        || !item_extent.is_finite()
        || item_extent <= 0.0
    {
        return VisibleRange::EMPTY;
    }

    let top = scroll_offset.max(0.0);
    let bottom = top + viewport_extent.max(0.0);

    let start = floor_index(top / item_extent).min(len);
    let end = ceil_index(bottom / item_extent).min(len).max(start);

    VisibleRange {
        start,
        end,
        realized_start: start.saturating_sub(overscan),
        realized_end: end.saturating_add(overscan).min(len),
    }
}

// Inputs are finite and non-negative here, so truncation is a floor.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Callers pass finite, non-negative quotients; results are clamped to `len`"
)]
fn floor_index(q: f64) -> usize {
    q as usize
}

fn ceil_index(q: f64) -> usize {
    let floor = floor_index(q);
    let exact = floor as f64 >= q;
    if exact { floor } else { floor.saturating_add(1) }
}
