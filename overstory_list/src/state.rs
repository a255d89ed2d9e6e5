// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use understory_data_adapter::Position;
use understory_virtual_list::VisibleRange;

/// Which edge of the loaded window a boundary load extends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards higher indices.
    Forward,
    /// Towards lower indices.
    Backward,
}

/// Why a load was issued; decides how its result is merged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadKind {
    /// First range fetched by `initialize`; replaces the window.
    Initial,
    /// Range adjacent to the loaded window; appended or prepended.
    Boundary(Direction),
    /// Direct request for a non-adjacent range; replaces the window unless
    /// it comes back empty.
    Jump,
    /// Follow-up ranges fetched by `initialize`; appended.
    Preload,
    /// Full reload of the first range; replaces the window.
    Refresh,
}

impl LoadKind {
    /// Returns `true` for kinds that start a new generation.
    #[must_use]
    pub fn resets(self) -> bool {
        matches!(self, Self::Jump | Self::Refresh)
    }

    /// Returns `true` for kinds whose failure is reported to the caller.
    ///
    /// Boundary and preload failures leave the view intact and only surface
    /// on the error channel.
    #[must_use]
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Initial | Self::Jump | Self::Refresh)
    }
}

/// Phase of the most recent logical load.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    /// Nothing in progress.
    #[default]
    Idle,
    /// A request is outstanding.
    Requesting,
    /// A response is being merged.
    Applying,
    /// A stale or redundant load was dropped.
    Blocked,
    /// The last load failed; state is unchanged.
    Failed,
}

/// Authoritative list state.
///
/// `ids` is the loaded window in display order; the items themselves live in
/// the list's collection. `window_offset` is the logical index of `ids[0]`,
/// non-zero after a jump.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListState {
    pub(crate) ids: Vec<String>,
    pub(crate) window_offset: usize,
    pub(crate) visible: VisibleRange,
    pub(crate) scroll_top: f64,
    pub(crate) container_height: f64,
    pub(crate) next: Option<Position>,
    pub(crate) prev: Option<Position>,
    pub(crate) total_count: Option<u64>,
    pub(crate) loading: bool,
}

impl ListState {
    /// Ids of the loaded window in display order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of loaded items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Logical index of the first loaded item.
    #[must_use]
    pub fn window_offset(&self) -> usize {
        self.window_offset
    }

    /// Visible and realized range, in window indices.
    #[must_use]
    pub fn visible_range(&self) -> VisibleRange {
        self.visible
    }

    /// Last sampled scroll offset.
    #[must_use]
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Last known viewport height.
    #[must_use]
    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    /// Position the next forward boundary load will read.
    #[must_use]
    pub fn next_position(&self) -> Option<&Position> {
        self.next.as_ref()
    }

    /// Position the next backward boundary load will read.
    #[must_use]
    pub fn prev_position(&self) -> Option<&Position> {
        self.prev.as_ref()
    }

    /// Returns `true` if more items exist after the window.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns `true` if more items exist before the window.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    /// Server-reported total, if any.
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Returns `true` while any load is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of logical rows the spacer and range math cover.
    pub(crate) fn logical_len(&self) -> usize {
        let loaded = self.window_offset + self.ids.len();
        match self.total_count.and_then(|total| usize::try_from(total).ok()) {
            Some(total) => total.max(loaded),
            None => loaded,
        }
    }
}
