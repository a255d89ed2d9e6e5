// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// The scrollable surface a list is mounted in.
///
/// Mirrors the usual DOM-style metrics. The list never lays out its own
/// viewport; it reads these values and sizes a spacer so the surface reports
/// the full logical extent.
pub trait ScrollContainer {
    /// Current vertical scroll offset.
    fn scroll_top(&self) -> f64;

    /// Height of the visible viewport.
    fn client_height(&self) -> f64;

    /// Height of the scrollable content.
    fn scroll_height(&self) -> f64;

    /// Moves the scroll offset.
    fn set_scroll_top(&mut self, scroll_top: f64);

    /// Resizes the spacer that stands in for the full list extent.
    fn set_spacer_extent(&mut self, extent: f64);
}
