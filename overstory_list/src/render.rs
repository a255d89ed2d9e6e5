// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::RefCell;
use core::fmt;
use core::ops::Range;

use understory_virtual_list::{ElementPool, PoolStats};

/// Host hooks that turn items into display elements.
///
/// Elements are pooled: an element leaving the realized range is
/// [released](Self::release) and later handed back to
/// [`update`](Self::update) for a different item instead of being dropped.
pub trait ItemRenderer<T> {
    /// Host element type.
    type Element;

    /// Builds an element for `item` at logical `index`.
    fn create(&mut self, index: usize, item: &T) -> Self::Element;

    /// Rebinds a recycled element to `item` at logical `index`.
    fn update(&mut self, element: &mut Self::Element, index: usize, item: &T);

    /// Positions an element at `offset` within the spacer.
    fn place(&mut self, element: &mut Self::Element, offset: f64) {
        let _ = (element, offset);
    }

    /// Detaches an element that left the realized range.
    fn release(&mut self, element: &mut Self::Element) {
        let _ = element;
    }
}

/// Realized elements keyed by logical index.
pub(crate) struct Materializer<E> {
    pool: ElementPool<E>,
    totals: PoolStats,
    stale: bool,
}

impl<E> fmt::Debug for Materializer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("active", &self.pool.active_len())
            .field("free", &self.pool.free_len())
            .field("realized", &self.pool.realized())
            .field("totals", &self.totals)
            .field("stale", &self.stale)
            .finish()
    }
}

impl<E> Materializer<E> {
    pub(crate) fn new() -> Self {
        Self {
            pool: ElementPool::new(),
            totals: PoolStats::default(),
            stale: false,
        }
    }

    pub(crate) fn pool(&self) -> &ElementPool<E> {
        &self.pool
    }

    pub(crate) fn totals(&self) -> PoolStats {
        self.totals
    }

    /// Forces every realized element to be rebound on the next render.
    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Realizes `items`, which hold logical indices `first..first + len`,
    /// and releases everything else.
    pub(crate) fn render<T, R>(
        &mut self,
        renderer: &mut R,
        first: usize,
        items: &[&T],
        item_height: f64,
    ) -> PoolStats
    where
        R: ItemRenderer<T, Element = E>,
    {
        let renderer = RefCell::new(renderer);
        if self.stale {
            self.pool.invalidate(|element| renderer.borrow_mut().release(element));
            self.stale = false;
        }
        let range: Range<usize> = first..first + items.len();
        let stats = self.pool.sync(
            range,
            |index, recycled| {
                let item = items[index - first];
                let mut renderer = renderer.borrow_mut();
                let mut element = match recycled {
                    Some(mut element) => {
                        renderer.update(&mut element, index, item);
                        element
                    }
                    None => renderer.create(index, item),
                };
                renderer.place(&mut element, index as f64 * item_height);
                element
            },
            |element| renderer.borrow_mut().release(element),
        );
        self.totals.created += stats.created;
        self.totals.recycled += stats.recycled;
        self.totals.released += stats.released;
        stats
    }

    /// Releases and drops every element.
    pub(crate) fn teardown(&mut self, release: impl FnMut(&mut E)) {
        self.pool.invalidate(release);
        self.pool.drain();
    }
}
