// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load orchestration: begin, fetch, apply.
//!
//! A load is split so the manager is never borrowed across an await:
//! [`ListManager::begin_load`] decides synchronously whether to request,
//! [`LoadTicket::fetch`] awaits the adapter through a shared handle, and
//! [`ListManager::apply`] merges the result synchronously. Tickets carry the
//! generation they were issued in; jumps, refreshes, and teardown start a
//! new generation, and completions from an older one are discarded.

use core::fmt;
use std::rc::Rc;

use hashbrown::HashSet;
use tracing::{debug, warn};
use understory_collection::{CollectionError, Keyed};
use understory_data_adapter::{AdapterError, DataAdapter, Page, Position, Query, Strategy};

use crate::container::ScrollContainer;
use crate::error::ListError;
use crate::manager::{FailedLoad, InFlight, ListManager, ListSource, LoadStatus};
use crate::render::ItemRenderer;
use crate::state::{Direction, LoadKind, LoadPhase};

/// What happened to a requested load.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadOutcome {
    /// Items were merged into the window.
    Applied {
        /// Number of items placed, after deduplication.
        added: usize,
    },
    /// A jump returned no items; the previous window was kept.
    Preserved,
    /// The load was stale or targeted an already loaded range.
    Blocked,
    /// A load for the same range was already in flight.
    Suppressed,
    /// The request was cancelled.
    Aborted,
    /// A boundary or preload request failed; the view is unchanged.
    Failed,
    /// There is no range in the requested direction.
    Exhausted,
    /// The target index was already loaded; the list scrolled to it.
    InWindow,
}

/// A load that has been started and must be fetched, then applied.
pub struct LoadTicket<T> {
    adapter: Rc<dyn DataAdapter<T>>,
    query: Query,
    kind: LoadKind,
    position: Position,
    generation: u64,
    anchor: Option<usize>,
}

impl<T> fmt::Debug for LoadTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTicket")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("generation", &self.generation)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl<T> LoadTicket<T> {
    /// Why the load was issued.
    #[must_use]
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// The range being read.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Generation the ticket was issued in.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Performs the read.
    pub async fn fetch(self) -> LoadCompletion<T> {
        let result = self.adapter.fetch(&self.query, &self.position).await;
        LoadCompletion {
            kind: self.kind,
            position: self.position,
            generation: self.generation,
            anchor: self.anchor,
            result,
        }
    }
}

/// A fetched load, ready for [`ListManager::apply`].
pub struct LoadCompletion<T> {
    kind: LoadKind,
    position: Position,
    generation: u64,
    anchor: Option<usize>,
    result: Result<Page<T>, AdapterError>,
}

impl<T> fmt::Debug for LoadCompletion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("generation", &self.generation)
            .field("ok", &self.result.is_ok())
            .finish_non_exhaustive()
    }
}

impl<T> LoadCompletion<T> {
    /// Why the load was issued.
    #[must_use]
    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    /// Generation the load was issued in.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Either a ticket to fetch, or why none was issued.
type Started<T> = Result<LoadTicket<T>, LoadOutcome>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Placement {
    Replace,
    Append,
    Prepend,
}

impl<T, C, R> ListManager<T, C, R>
where
    T: Keyed + 'static,
    C: ScrollContainer,
    R: ItemRenderer<T>,
{
    /// Starts a load of `position`.
    ///
    /// Returns `None` when the load is not issued: a load for the same range
    /// is already in flight, or a boundary or preload load targets a range
    /// that is already loaded. Jumps and refreshes start a new generation and
    /// abort every outstanding request.
    pub fn begin_load(
        &mut self,
        kind: LoadKind,
        position: Position,
    ) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.begin(kind, position, None)?.ok())
    }

    /// Starts a forward boundary load, if a next range exists.
    pub fn begin_next(&mut self) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_edge(Direction::Forward)?.ok())
    }

    /// Starts a backward boundary load, if a previous range exists.
    pub fn begin_prev(&mut self) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_edge(Direction::Backward)?.ok())
    }

    /// Starts a jump to 1-based `page`, sized by the adapter's page size.
    pub fn begin_jump_to_page(&mut self, page: u32) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_jump_to_page(page)?.ok())
    }

    /// Scrolls to logical `index`, starting a jump when it lies outside the
    /// loaded window.
    pub fn begin_scroll_to_index(
        &mut self,
        index: usize,
    ) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_scroll_to_index(index)?.ok())
    }

    /// Re-issues the last failed load.
    pub fn begin_retry(&mut self) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_retry()?.ok())
    }

    /// Starts a full reload of the first range.
    pub fn begin_refresh(&mut self) -> Result<Option<LoadTicket<T>>, ListError> {
        Ok(self.start_refresh()?.ok())
    }

    /// Fetches and applies a load of `position`.
    pub async fn load(
        &mut self,
        kind: LoadKind,
        position: Position,
    ) -> Result<LoadOutcome, ListError> {
        let started = self.begin(kind, position, None)?;
        self.run(started).await
    }

    /// Loads the range after the window.
    pub async fn load_next(&mut self) -> Result<LoadOutcome, ListError> {
        let started = self.start_edge(Direction::Forward)?;
        self.run(started).await
    }

    /// Loads the range before the window.
    pub async fn load_prev(&mut self) -> Result<LoadOutcome, ListError> {
        let started = self.start_edge(Direction::Backward)?;
        self.run(started).await
    }

    /// Replaces the window with 1-based `page` and scrolls to it.
    ///
    /// A page that comes back empty leaves the current window in place.
    pub async fn jump_to_page(&mut self, page: u32) -> Result<LoadOutcome, ListError> {
        let started = self.start_jump_to_page(page)?;
        self.run(started).await
    }

    /// Scrolls to logical `index`, jumping when it is not loaded.
    pub async fn scroll_to_index(&mut self, index: usize) -> Result<LoadOutcome, ListError> {
        let started = self.start_scroll_to_index(index)?;
        self.run(started).await
    }

    /// Re-issues the last failed load.
    pub async fn retry(&mut self) -> Result<LoadOutcome, ListError> {
        let started = self.start_retry()?;
        self.run(started).await
    }

    /// Discards the window and reloads the first range.
    pub async fn refresh(&mut self) -> Result<LoadOutcome, ListError> {
        let started = self.start_refresh()?;
        self.run(started).await
    }

    async fn run(&mut self, started: Started<T>) -> Result<LoadOutcome, ListError> {
        match started {
            Ok(ticket) => {
                let completion = ticket.fetch().await;
                self.apply(completion)
            }
            Err(outcome) => Ok(outcome),
        }
    }

    /// Merges a fetched load into the list.
    ///
    /// Completions from an older generation, and boundary loads that no
    /// longer extend the window edge, are dropped as
    /// [`LoadOutcome::Blocked`]. Failures are published on the collection's
    /// error feed and leave the window unchanged; initial, jump, and refresh
    /// failures are also returned as errors.
    pub fn apply(&mut self, completion: LoadCompletion<T>) -> Result<LoadOutcome, ListError> {
        if self.destroyed {
            return Err(ListError::Destroyed);
        }
        let LoadCompletion {
            kind,
            position,
            generation,
            anchor,
            result,
        } = completion;

        if generation != self.generation {
            self.phase = LoadPhase::Blocked;
            debug!(
                ?kind,
                key = ?position,
                generation,
                current = self.generation,
                "stale load discarded"
            );
            return Ok(LoadOutcome::Blocked);
        }
        if let Some(slot) = self
            .in_flight
            .iter()
            .position(|f| f.kind == kind && f.position == position)
        {
            self.in_flight.remove(slot);
        }
        self.state.loading = !self.in_flight.is_empty();

        let page = match result {
            Err(err) => {
                self.phase = LoadPhase::Failed;
                warn!(?kind, key = ?position, error = %err, "load failed");
                self.collection.report_error(&err);
                self.failed = Some(FailedLoad {
                    kind,
                    position,
                    anchor,
                });
                return if kind.is_visible() {
                    Err(err.into())
                } else {
                    Ok(LoadOutcome::Failed)
                };
            }
            Ok(page) if page.is_aborted() => {
                self.phase = self.settled_phase();
                debug!(?kind, key = ?position, "load aborted");
                return Ok(LoadOutcome::Aborted);
            }
            Ok(page) => page,
        };

        let edge = match kind {
            LoadKind::Boundary(Direction::Forward) | LoadKind::Preload => self.state.next.as_ref(),
            LoadKind::Boundary(Direction::Backward) => self.state.prev.as_ref(),
            LoadKind::Initial | LoadKind::Jump | LoadKind::Refresh => Some(&position),
        };
        if edge != Some(&position) {
            self.phase = LoadPhase::Blocked;
            debug!(?kind, key = ?position, "load no longer extends the window");
            return Ok(LoadOutcome::Blocked);
        }

        let placement = match kind {
            LoadKind::Jump if page.items.is_empty() => {
                self.phase = self.settled_phase();
                debug!(key = ?position, "jump returned no items; keeping the current window");
                return Ok(LoadOutcome::Preserved);
            }
            LoadKind::Initial | LoadKind::Jump | LoadKind::Refresh => Placement::Replace,
            LoadKind::Boundary(Direction::Forward) | LoadKind::Preload => Placement::Append,
            LoadKind::Boundary(Direction::Backward) => Placement::Prepend,
        };

        self.phase = LoadPhase::Applying;
        let returned = page.items.len();
        let next = position.next(&page.meta, returned);
        let placed = match self.merge(page.items, placement) {
            Ok(placed) => placed,
            Err(err) => {
                // The collection has already published the rejection.
                self.phase = LoadPhase::Failed;
                warn!(?kind, key = ?position, error = %err, "loaded items rejected");
                self.failed = Some(FailedLoad {
                    kind,
                    position,
                    anchor,
                });
                return if kind.is_visible() {
                    Err(err.into())
                } else {
                    Ok(LoadOutcome::Failed)
                };
            }
        };

        if page.meta.total.is_some() || placement == Placement::Replace {
            self.state.total_count = page.meta.total;
        }
        match placement {
            Placement::Replace => {
                self.state.window_offset = position
                    .start_index()
                    .and_then(|index| usize::try_from(index).ok())
                    .unwrap_or(0);
                self.state.prev = position.prev();
                self.state.next = next;
                self.loaded = vec![position];
                self.spacer.reset();
                self.materializer.mark_stale();
                let target = match kind {
                    LoadKind::Jump => anchor.unwrap_or(self.state.window_offset),
                    _ => 0,
                };
                self.scroll_to(target);
            }
            Placement::Append => {
                self.state.next = next;
                self.loaded.push(position);
            }
            Placement::Prepend => {
                self.state.window_offset = position
                    .start_index()
                    .and_then(|index| usize::try_from(index).ok())
                    .unwrap_or_else(|| self.state.window_offset.saturating_sub(placed.len()));
                self.state.prev = position.prev();
                self.loaded.insert(0, position);
            }
        }
        if !self.config.dedupe_items {
            self.materializer.mark_stale();
        }

        self.failed = None;
        self.phase = self.settled_phase();
        self.sync_view();
        self.notify_after_load(&placed);
        Ok(LoadOutcome::Applied {
            added: placed.len(),
        })
    }

    /// Writes loaded items into the collection and the window order.
    ///
    /// With deduplication on, items whose id is already present (or repeated
    /// in the batch) are dropped. With it off, every item is placed and
    /// repeated ids are upserted, the last occurrence winning in storage.
    /// A replacing batch swaps the collection in one step, so a rejected
    /// item leaves the current window in place.
    fn merge(&mut self, items: Vec<T>, placement: Placement) -> Result<Vec<String>, CollectionError> {
        let replace = placement == Placement::Replace;
        let mut seen = HashSet::new();
        let (placed, batch) = if self.config.dedupe_items {
            let mut fresh = Vec::with_capacity(items.len());
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                let id = item.id().to_owned();
                if (!replace && self.collection.contains(&id)) || !seen.insert(id.clone()) {
                    continue;
                }
                ids.push(id);
                fresh.push(item);
            }
            (ids, fresh)
        } else {
            let ids: Vec<String> = items.iter().map(|item| item.id().to_owned()).collect();
            let mut batch: Vec<T> = items
                .into_iter()
                .rev()
                .filter(|item| seen.insert(item.id().to_owned()))
                .collect();
            batch.reverse();
            (ids, batch)
        };
        match placement {
            Placement::Replace => {
                self.collection.replace(batch)?;
                self.state.ids.clone_from(&placed);
            }
            Placement::Append => {
                self.admit(batch)?;
                self.state.ids.extend(placed.iter().cloned());
            }
            Placement::Prepend => {
                self.admit(batch)?;
                self.state.ids.splice(0..0, placed.iter().cloned());
            }
        }
        Ok(placed)
    }

    fn admit(&mut self, batch: Vec<T>) -> Result<(), CollectionError> {
        if self.config.dedupe_items {
            self.collection.add(batch)
        } else {
            self.collection.upsert(batch)
        }
    }

    fn notify_after_load(&mut self, placed: &[String]) {
        let Some(callback) = self.after_load.as_mut() else {
            return;
        };
        let items: Vec<&T> = placed
            .iter()
            .filter_map(|id| self.collection.get(id))
            .collect();
        let all_items: Vec<&T> = self
            .state
            .ids
            .iter()
            .filter_map(|id| self.collection.get(id))
            .collect();
        callback(&LoadStatus {
            loading: self.state.loading,
            has_next: self.state.next.is_some(),
            has_prev: self.state.prev.is_some(),
            items: &items,
            all_items: &all_items,
        });
    }

    fn settled_phase(&self) -> LoadPhase {
        if self.in_flight.is_empty() {
            LoadPhase::Idle
        } else {
            LoadPhase::Requesting
        }
    }

    fn scroll_to(&mut self, index: usize) {
        let top = index as f64 * self.config.item_height;
        self.container.set_scroll_top(top);
        self.state.scroll_top = self.container.scroll_top();
    }

    pub(crate) fn begin(
        &mut self,
        kind: LoadKind,
        position: Position,
        anchor: Option<usize>,
    ) -> Result<Started<T>, ListError> {
        self.ensure_ready()?;
        let adapter = self.adapter()?;

        let duplicate = self
            .in_flight
            .iter()
            .any(|f| f.position == position && (!kind.resets() || f.kind.resets()));
        if duplicate {
            debug!(?kind, key = ?position, "load suppressed: same range in flight");
            return Ok(Err(LoadOutcome::Suppressed));
        }

        if kind.resets() {
            self.generation += 1;
            let aborted = adapter.abort_in_flight();
            self.in_flight.clear();
            self.failed = None;
            if kind == LoadKind::Refresh {
                adapter.invalidate_cache();
            }
            debug!(?kind, generation = self.generation, aborted, "new load generation");
        } else if matches!(kind, LoadKind::Boundary(_) | LoadKind::Preload)
            && self.loaded.contains(&position)
        {
            self.phase = LoadPhase::Blocked;
            debug!(?kind, key = ?position, "load blocked: range already loaded");
            return Ok(Err(LoadOutcome::Blocked));
        }

        if self
            .failed
            .as_ref()
            .is_some_and(|failed| failed.position == position)
        {
            self.failed = None;
        }
        self.in_flight.push(InFlight {
            kind,
            position: position.clone(),
        });
        self.state.loading = true;
        self.phase = LoadPhase::Requesting;
        Ok(Ok(LoadTicket {
            adapter,
            query: self.query.clone(),
            kind,
            position,
            generation: self.generation,
            anchor,
        }))
    }

    fn ensure_ready(&self) -> Result<(), ListError> {
        if self.destroyed {
            Err(ListError::Destroyed)
        } else if !self.initialized {
            Err(ListError::NotInitialized)
        } else {
            Ok(())
        }
    }

    fn start_edge(&mut self, direction: Direction) -> Result<Started<T>, ListError> {
        self.ensure_ready()?;
        self.adapter()?;
        let target = match direction {
            Direction::Forward => self.state.next.clone(),
            Direction::Backward => self.state.prev.clone(),
        };
        match target {
            Some(position) => self.begin(LoadKind::Boundary(direction), position, None),
            None => Ok(Err(LoadOutcome::Exhausted)),
        }
    }

    fn start_jump_to_page(&mut self, page: u32) -> Result<Started<T>, ListError> {
        let adapter = self.adapter()?;
        let size = adapter.page_size().max(1);
        let index = u64::from(page.max(1) - 1) * u64::from(size);
        let position =
            Position::containing(adapter.strategy(), index, size).ok_or(ListError::Unaddressable)?;
        let anchor = usize::try_from(index).ok();
        self.begin(LoadKind::Jump, position, anchor)
    }

    fn start_scroll_to_index(&mut self, index: usize) -> Result<Started<T>, ListError> {
        self.ensure_ready()?;
        let window = self.state.window_offset..self.state.window_offset + self.state.ids.len();
        let in_window = window.contains(&index);
        let adapter = match &self.source {
            ListSource::Remote(adapter) if !in_window => Rc::clone(adapter),
            _ => {
                let last = self.state.logical_len().saturating_sub(1);
                self.scroll_to(index.min(last));
                self.sync_view();
                return Ok(Err(LoadOutcome::InWindow));
            }
        };
        let strategy = adapter.strategy();
        if strategy == Strategy::Cursor {
            return Err(ListError::Unaddressable);
        }
        let position = Position::containing(strategy, index as u64, adapter.page_size())
            .ok_or(ListError::Unaddressable)?;
        self.begin(LoadKind::Jump, position, Some(index))
    }

    fn start_retry(&mut self) -> Result<Started<T>, ListError> {
        self.ensure_ready()?;
        self.adapter()?;
        match self.failed.clone() {
            Some(failed) => self.begin(failed.kind, failed.position, failed.anchor),
            None => Ok(Err(LoadOutcome::Exhausted)),
        }
    }

    fn start_refresh(&mut self) -> Result<Started<T>, ListError> {
        let first = self.adapter()?.first_position();
        self.begin(LoadKind::Refresh, first, None)
    }
}
