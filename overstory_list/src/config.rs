// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;

use serde::Deserialize;

use crate::resize::ResizeMode;

/// List controller configuration.
///
/// Deserializes from camelCase keys; missing keys take the defaults below.
///
/// | Key | Default |
/// |---|---|
/// | `itemHeight` | 48 |
/// | `overscan` | 3 |
/// | `dedupeItems` | `true` |
/// | `initialRangesToFetch` | 1 |
/// | `loadThreshold` | 5 |
/// | `scrollEndDebounce` (ms) | 150 |
/// | `resizeDebounce` (ms) | 100 |
/// | `resizeMode` | `"observer"` |
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListConfig {
    /// Fixed row extent in pixels.
    pub item_height: f64,
    /// Rows realized beyond each edge of the viewport.
    pub overscan: usize,
    /// Drop loaded items whose id is already present.
    pub dedupe_items: bool,
    /// Ranges fetched sequentially by `initialize`.
    pub initial_ranges_to_fetch: usize,
    /// Distance in rows from a window edge that triggers a boundary load.
    pub load_threshold: usize,
    /// Quiet period after the last scroll event before scrolling ends, in ms.
    #[serde(rename = "scrollEndDebounce")]
    pub scroll_end_debounce_ms: u64,
    /// Quiet period for the window-resize fallback, in ms.
    #[serde(rename = "resizeDebounce")]
    pub resize_debounce_ms: u64,
    /// How container resizes are delivered.
    pub resize_mode: ResizeMode,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            item_height: 48.0,
            overscan: 3,
            dedupe_items: true,
            initial_ranges_to_fetch: 1,
            load_threshold: 5,
            scroll_end_debounce_ms: 150,
            resize_debounce_ms: 100,
            resize_mode: ResizeMode::Observer,
        }
    }
}

impl ListConfig {
    /// Sets the row extent.
    #[must_use]
    pub fn with_item_height(mut self, item_height: f64) -> Self {
        self.item_height = item_height;
        self
    }

    /// Sets the overscan.
    #[must_use]
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Enables or disables deduplication of loaded items.
    #[must_use]
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe_items = dedupe;
        self
    }

    /// Sets how many ranges `initialize` fetches.
    #[must_use]
    pub fn with_initial_ranges(mut self, ranges: usize) -> Self {
        self.initial_ranges_to_fetch = ranges;
        self
    }

    /// Sets the boundary-load threshold in rows.
    #[must_use]
    pub fn with_load_threshold(mut self, rows: usize) -> Self {
        self.load_threshold = rows;
        self
    }

    /// Sets the resize delivery mode.
    #[must_use]
    pub fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    /// Scroll-end debounce as a [`Duration`].
    #[must_use]
    pub fn scroll_end_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_end_debounce_ms)
    }

    /// Resize fallback debounce as a [`Duration`].
    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}
