// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::mem;
use core::ops::Range;
use std::rc::Rc;

use bitflags::bitflags;
use smallvec::SmallVec;
use tracing::{debug, trace};
use understory_collection::{Collection, Keyed, Notification, Subscription};
use understory_data_adapter::{DataAdapter, Position, Query};
use understory_virtual_list::{
    ExtentSource, PoolStats, SpacerExtent, VisibleRange, compute_visible_range,
};
use web_time::Instant;

use crate::config::ListConfig;
use crate::container::ScrollContainer;
use crate::error::ListError;
use crate::load::{LoadOutcome, LoadTicket};
use crate::render::{ItemRenderer, Materializer};
use crate::resize::ResizeTracker;
use crate::scroll::ScrollTracker;
use crate::state::{Direction, ListState, LoadKind, LoadPhase};

/// Where a list gets its items.
pub enum ListSource<T> {
    /// A fixed set of items installed by `initialize`.
    Static(Vec<T>),
    /// A remote adapter read range by range.
    Remote(Rc<dyn DataAdapter<T>>),
}

impl<T> ListSource<T> {
    /// Wraps an adapter.
    pub fn remote(adapter: impl DataAdapter<T> + 'static) -> Self {
        Self::Remote(Rc::new(adapter))
    }
}

impl<T> fmt::Debug for ListSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(items) => f.debug_tuple("Static").field(&items.len()).finish(),
            Self::Remote(adapter) => f
                .debug_struct("Remote")
                .field("strategy", &adapter.strategy())
                .finish_non_exhaustive(),
        }
    }
}

bitflags! {
    /// What changed during one frame.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FrameChanges: u8 {
        /// The visible or realized range moved.
        const RANGE = 1 << 0;
        /// The spacer extent was recomputed.
        const SPACER = 1 << 1;
        /// A container resize was applied.
        const RESIZED = 1 << 2;
        /// Scrolling settled this frame.
        const SCROLL_END = 1 << 3;
    }
}

/// Result of [`ListManager::on_frame`].
pub struct FrameOutcome<T> {
    /// What changed.
    pub changes: FrameChanges,
    /// Range after the frame, in window indices.
    pub range: VisibleRange,
    /// Boundary load the host should fetch and [apply](ListManager::apply).
    pub load: Option<LoadTicket<T>>,
    /// Whether the host must schedule another frame.
    pub reschedule: bool,
    /// Element pool activity during this frame.
    pub render: PoolStats,
}

impl<T> FrameOutcome<T> {
    fn idle(range: VisibleRange) -> Self {
        Self {
            changes: FrameChanges::empty(),
            range,
            load: None,
            reschedule: false,
            render: PoolStats::default(),
        }
    }
}

impl<T> fmt::Debug for FrameOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameOutcome")
            .field("changes", &self.changes)
            .field("range", &self.range)
            .field("load", &self.load)
            .field("reschedule", &self.reschedule)
            .field("render", &self.render)
            .finish()
    }
}

/// Snapshot passed to the after-load callback.
#[derive(Debug)]
pub struct LoadStatus<'a, T> {
    /// Whether other loads are still outstanding.
    pub loading: bool,
    /// Whether items exist after the window.
    pub has_next: bool,
    /// Whether items exist before the window.
    pub has_prev: bool,
    /// Items placed by this load.
    pub items: &'a [&'a T],
    /// The whole window in display order.
    pub all_items: &'a [&'a T],
}

type AfterLoad<T> = Box<dyn FnMut(&LoadStatus<'_, T>)>;

/// An outstanding load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub(crate) kind: LoadKind,
    pub(crate) position: Position,
}

/// The most recent failed load, kept for [`ListManager::retry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FailedLoad {
    pub(crate) kind: LoadKind,
    pub(crate) position: Position,
    pub(crate) anchor: Option<usize>,
}

/// Snapshot of a list's internal state for debugging and inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct ListDebugInfo {
    /// Phase of the most recent load.
    pub phase: LoadPhase,
    /// Current load generation.
    pub generation: u64,
    /// Whether `initialize` has run.
    pub initialized: bool,
    /// Whether `destroy` has run.
    pub destroyed: bool,
    /// Loaded item count.
    pub len: usize,
    /// Logical index of the first loaded item.
    pub window_offset: usize,
    /// Server-reported total.
    pub total_count: Option<u64>,
    /// Whether a forward range exists.
    pub has_next: bool,
    /// Whether a backward range exists.
    pub has_prev: bool,
    /// Number of outstanding loads.
    pub in_flight: usize,
    /// Kind of the last failed load, until retried or superseded.
    pub failed: Option<LoadKind>,
    /// Current range, in window indices.
    pub visible: VisibleRange,
    /// Last sampled scroll offset.
    pub scroll_top: f64,
    /// Last known viewport height.
    pub container_height: f64,
    /// Whether a scroll gesture is in progress.
    pub scrolling: bool,
    /// Spacer extent.
    pub spacer_extent: f64,
    /// Where the spacer extent came from.
    pub spacer_source: ExtentSource,
    /// Whether the spacer awaits recomputation.
    pub spacer_dirty: bool,
    /// Realized logical indices.
    pub realized: Range<usize>,
    /// Elements bound to an index.
    pub active_elements: usize,
    /// Elements parked for reuse.
    pub free_elements: usize,
    /// Cumulative pool activity.
    pub pool_totals: PoolStats,
}

/// Virtualized list controller.
///
/// Owns the collection, the authoritative [`ListState`], and the trackers
/// that turn scroll and resize events into range updates and boundary loads.
/// See the [crate documentation](crate) for the event and load flow.
pub struct ListManager<T, C, R>
where
    T: Keyed + 'static,
    C: ScrollContainer,
    R: ItemRenderer<T>,
{
    pub(crate) config: ListConfig,
    pub(crate) source: ListSource<T>,
    pub(crate) container: C,
    pub(crate) renderer: R,
    pub(crate) collection: Collection<T>,
    pub(crate) state: ListState,
    pub(crate) query: Query,
    pub(crate) phase: LoadPhase,
    pub(crate) generation: u64,
    pub(crate) in_flight: SmallVec<[InFlight; 2]>,
    pub(crate) loaded: Vec<Position>,
    pub(crate) failed: Option<FailedLoad>,
    pub(crate) spacer: SpacerExtent,
    pub(crate) spacer_applied: Option<f64>,
    pub(crate) scroll: ScrollTracker,
    pub(crate) resize: ResizeTracker,
    pub(crate) materializer: Materializer<R::Element>,
    pub(crate) after_load: Option<AfterLoad<T>>,
    pub(crate) initialized: bool,
    pub(crate) destroyed: bool,
}

impl<T, C, R> fmt::Debug for ListManager<T, C, R>
where
    T: Keyed + 'static,
    C: ScrollContainer,
    R: ItemRenderer<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListManager")
            .field("config", &self.config)
            .field("source", &self.source)
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight)
            .field("materializer", &self.materializer)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<T, C, R> ListManager<T, C, R>
where
    T: Keyed + 'static,
    C: ScrollContainer,
    R: ItemRenderer<T>,
{
    /// Creates a list. Nothing is read or rendered until
    /// [`initialize`](Self::initialize).
    pub fn new(config: ListConfig, source: ListSource<T>, container: C, renderer: R) -> Self {
        let scroll = ScrollTracker::new(config.scroll_end_debounce());
        let resize = ResizeTracker::new(config.resize_mode, config.resize_debounce());
        Self {
            config,
            source,
            container,
            renderer,
            collection: Collection::new(),
            state: ListState::default(),
            query: Query::new(),
            phase: LoadPhase::Idle,
            generation: 0,
            in_flight: SmallVec::new(),
            loaded: Vec::new(),
            failed: None,
            spacer: SpacerExtent::new(),
            spacer_applied: None,
            scroll,
            resize,
            materializer: Materializer::new(),
            after_load: None,
            initialized: false,
            destroyed: false,
        }
    }

    /// Sets the filter sent with every remote read.
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// The authoritative list state.
    #[must_use]
    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// The collection backing the loaded window.
    #[must_use]
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    /// The scroll container.
    #[must_use]
    pub fn container(&self) -> &C {
        &self.container
    }

    /// The scroll container, mutably. Call [`on_scroll`](Self::on_scroll)
    /// after moving it.
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// The item renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Phase of the most recent load.
    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Current load generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Loaded items in display order.
    #[must_use]
    pub fn items(&self) -> Vec<&T> {
        self.state
            .ids
            .iter()
            .filter_map(|id| self.collection.get(id))
            .collect()
    }

    /// The loaded item at logical `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&T> {
        let slot = index.checked_sub(self.state.window_offset)?;
        self.state
            .ids
            .get(slot)
            .and_then(|id| self.collection.get(id))
    }

    /// The element realized for logical `index`.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&R::Element> {
        self.materializer.pool().get(index)
    }

    /// Registers an observer on the collection's event feed.
    ///
    /// Load failures are reported on the same feed as collection errors.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&Notification<'_, T>) + 'static,
    ) -> Subscription {
        self.collection.subscribe(observer)
    }

    /// Removes an observer registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.collection.unsubscribe(subscription)
    }

    /// Sets the callback invoked after every successfully applied load.
    pub fn after_load(&mut self, callback: impl FnMut(&LoadStatus<'_, T>) + 'static) {
        self.after_load = Some(Box::new(callback));
    }

    /// Reads the container metrics, installs or preloads the first items,
    /// and renders.
    ///
    /// Remote lists fetch up to `initial_ranges_to_fetch` ranges in sequence,
    /// stopping early at the end of the data or on a failed follow-up range.
    /// A failed first range is returned as an error and can be retried.
    pub async fn initialize(&mut self) -> Result<(), ListError> {
        if self.destroyed {
            return Err(ListError::Destroyed);
        }
        if self.initialized {
            return Ok(());
        }
        self.state.scroll_top = self.container.scroll_top();
        self.state.container_height = self.container.client_height();
        self.initialized = true;
        self.scroll.start();

        let first = match &mut self.source {
            ListSource::Static(items) => {
                let items = mem::take(items);
                let ids: Vec<String> = items.iter().map(|item| item.id().to_owned()).collect();
                self.collection.add(items)?;
                self.state.total_count = Some(ids.len() as u64);
                self.state.ids = ids;
                self.sync_view();
                return Ok(());
            }
            ListSource::Remote(adapter) => adapter.first_position(),
        };

        let mut target = Some((LoadKind::Initial, first));
        for _ in 0..self.config.initial_ranges_to_fetch.max(1) {
            let Some((kind, position)) = target.take() else {
                break;
            };
            let outcome = self.load(kind, position).await?;
            if !matches!(outcome, LoadOutcome::Applied { .. }) {
                break;
            }
            target = self.state.next.clone().map(|next| (LoadKind::Preload, next));
        }
        self.sync_view();
        Ok(())
    }

    /// Records a scroll event. Returns `true` if the host must schedule a
    /// frame and then call [`on_frame`](Self::on_frame).
    pub fn on_scroll(&mut self, now: Instant) -> bool {
        if !self.initialized || self.destroyed {
            return false;
        }
        self.scroll.on_scroll(now)
    }

    /// Records a container resize. Returns `true` if the host must schedule a
    /// frame; in window-fallback mode the host waits for
    /// [`next_deadline`](Self::next_deadline) instead.
    pub fn on_resize(&mut self, height: f64, now: Instant) -> bool {
        if !self.initialized || self.destroyed {
            return false;
        }
        self.resize.on_resize(height, now)
    }

    /// Earliest instant a pending scroll-end or resize settles.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.scroll.deadline(), self.resize.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs one frame: samples the scroll offset, applies pending resizes,
    /// updates the range and spacer, re-renders, and checks the window
    /// edges for a boundary load.
    pub fn on_frame(&mut self, now: Instant) -> FrameOutcome<T> {
        let mut outcome = FrameOutcome::idle(self.state.visible);
        if !self.initialized || self.destroyed {
            return outcome;
        }

        let sample = self.scroll.on_frame(self.container.scroll_top(), now);
        self.state.scroll_top = sample.scroll_top;
        if sample.ended {
            outcome.changes |= FrameChanges::SCROLL_END;
        }
        if let Some(height) = self.resize.poll(now) {
            if height != self.state.container_height {
                self.state.container_height = height;
                outcome.changes |= FrameChanges::RESIZED;
            }
        }
        if (self.spacer.is_dirty() || self.spacer.is_held()) && self.refresh_spacer() {
            outcome.changes |= FrameChanges::SPACER;
        }
        if self.update_range() {
            outcome.changes |= FrameChanges::RANGE;
            outcome.render = self.render();
        }

        outcome.load = self.boundary_ticket();
        outcome.reschedule = sample.reschedule;
        outcome.range = self.state.visible;
        trace!(
            scroll_top = sample.scroll_top,
            range = ?outcome.range.visible(),
            changes = ?outcome.changes,
            "list frame"
        );
        outcome
    }

    /// Snapshot of the current state for debugging and inspection.
    #[must_use]
    pub fn debug_info(&self) -> ListDebugInfo {
        let pool = self.materializer.pool();
        ListDebugInfo {
            phase: self.phase,
            generation: self.generation,
            initialized: self.initialized,
            destroyed: self.destroyed,
            len: self.state.ids.len(),
            window_offset: self.state.window_offset,
            total_count: self.state.total_count,
            has_next: self.state.has_next(),
            has_prev: self.state.has_prev(),
            in_flight: self.in_flight.len(),
            failed: self.failed.as_ref().map(|failed| failed.kind),
            visible: self.state.visible,
            scroll_top: self.state.scroll_top,
            container_height: self.state.container_height,
            scrolling: self.scroll.is_scrolling(),
            spacer_extent: self.spacer.extent(),
            spacer_source: self.spacer.source(),
            spacer_dirty: self.spacer.is_dirty(),
            realized: pool.realized(),
            active_elements: pool.active_len(),
            free_elements: pool.free_len(),
            pool_totals: self.materializer.totals(),
        }
    }

    /// Tears the list down: aborts outstanding requests, clears the adapter
    /// caches, drops observers and the after-load callback, and releases
    /// every element.
    ///
    /// Idempotent; also runs on drop. Tickets issued before teardown are
    /// discarded when applied.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.generation += 1;
        if let ListSource::Remote(adapter) = &self.source {
            adapter.disconnect();
        }
        self.in_flight.clear();
        self.state.loading = false;
        self.phase = LoadPhase::Idle;
        self.collection.clear_subscriptions();
        self.after_load = None;
        self.scroll.stop();
        self.resize.clear();
        let renderer = &mut self.renderer;
        self.materializer
            .teardown(|element| renderer.release(element));
        debug!(generation = self.generation, "list destroyed");
    }

    pub(crate) fn adapter(&self) -> Result<Rc<dyn DataAdapter<T>>, ListError> {
        match &self.source {
            ListSource::Remote(adapter) => Ok(Rc::clone(adapter)),
            ListSource::Static(_) => Err(ListError::StaticSource),
        }
    }

    /// Recomputes spacer, range, and elements after the window changed.
    pub(crate) fn sync_view(&mut self) {
        self.refresh_spacer();
        self.update_range();
        self.render();
    }

    /// Recomputes the range in logical rows, then maps it into the window.
    pub(crate) fn update_range(&mut self) -> bool {
        let logical = compute_visible_range(
            self.state.scroll_top,
            self.state.container_height,
            self.config.item_height,
            self.state.logical_len(),
            self.config.overscan,
        );
        let range = logical.to_window(self.state.window_offset, self.state.ids.len());
        let changed = range != self.state.visible;
        self.state.visible = range;
        changed
    }

    /// Pushes the spacer extent to the container if it changed.
    pub(crate) fn refresh_spacer(&mut self) -> bool {
        let item_height = self.config.item_height;
        let loaded = self.state.window_offset + self.state.ids.len();
        let viewport_bottom = self.state.scroll_top + self.state.container_height;
        match self.state.total_count {
            Some(total) => {
                let total = usize::try_from(total).unwrap_or(usize::MAX);
                self.spacer
                    .set_exact(total.max(loaded), item_height, viewport_bottom);
            }
            None => self.spacer.mark_dirty(),
        }
        let extent = self.spacer.resolve(loaded, item_height, viewport_bottom);
        if self.spacer_applied == Some(extent) {
            return false;
        }
        self.container.set_spacer_extent(extent);
        self.spacer_applied = Some(extent);
        true
    }

    /// Realizes the items in the current range.
    pub(crate) fn render(&mut self) -> PoolStats {
        let realized = self.state.visible.realized();
        let first = self.state.window_offset + realized.start;
        let items: Vec<&T> = self
            .state
            .ids
            .get(realized)
            .unwrap_or_default()
            .iter()
            .map_while(|id| self.collection.get(id))
            .collect();
        self.materializer
            .render(&mut self.renderer, first, &items, self.config.item_height)
    }

    /// Starts a boundary load when the range nears a window edge.
    ///
    /// Quietly skips edges that are already loading, and stops entirely after
    /// a failure until the host retries.
    fn boundary_ticket(&mut self) -> Option<LoadTicket<T>> {
        if self.failed.is_some() || !matches!(self.source, ListSource::Remote(_)) {
            return None;
        }
        let range = self.state.visible;
        let len = self.state.ids.len();
        let threshold = self.config.load_threshold;

        let forward = self
            .state
            .next
            .clone()
            .filter(|_| range.end + threshold >= len)
            .map(|next| (Direction::Forward, next));
        let backward = self
            .state
            .prev
            .clone()
            .filter(|_| range.start <= threshold)
            .map(|prev| (Direction::Backward, prev));

        for (direction, position) in forward.into_iter().chain(backward) {
            if self.in_flight.iter().any(|f| f.position == position) {
                continue;
            }
            if let Ok(Ok(ticket)) = self.begin(LoadKind::Boundary(direction), position, None) {
                return Some(ticket);
            }
        }
        None
    }
}

impl<T, C, R> Drop for ListManager<T, C, R>
where
    T: Keyed + 'static,
    C: ScrollContainer,
    R: ItemRenderer<T>,
{
    fn drop(&mut self) {
        self.destroy();
    }
}
