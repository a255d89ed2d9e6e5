// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element recycling for realized ranges.

use alloc::vec::Vec;
use core::ops::Range;

use hashbrown::HashMap;

/// Counters describing what one [`ElementPool::sync`] call did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Elements created because the free list was empty.
    pub created: usize,
    /// Elements taken from the free list and rebound to a new index.
    pub recycled: usize,
    /// Elements that left the realized range and went to the free list.
    pub released: usize,
}

/// Recycles host elements as indices enter and leave a realized range.
///
/// The pool maps realized indices to host elements `E` (DOM nodes, widget
/// handles, retained display items). On each [`ElementPool::sync`]:
///
/// 1. Elements whose index is outside the new range are passed to `release`
///    (hide/detach) and parked on a free list.
/// 2. Each index in the range without an element gets one from `realize`,
///    which receives a parked element to rebind if one is available.
///
/// Elements already realized for an index that stays in range are left alone.
/// Call [`ElementPool::invalidate`] when the data behind indices changes (for
/// example after a window replace) so every index is rebound on the next sync.
///
/// ```rust
/// use understory_virtual_list::ElementPool;
///
/// let mut pool = ElementPool::<String>::new();
/// let stats = pool.sync(0..3, |i, _recycled| format!("row {i}"), |_| {});
/// assert_eq!(stats.created, 3);
///
/// // Scrolling by one row recycles the element that left the range.
/// let stats = pool.sync(1..4, |i, recycled| {
///     let mut el = recycled.unwrap_or_default();
///     el.clear();
///     el.push_str(&format!("row {i}"));
///     el
/// }, |_| {});
/// assert_eq!((stats.created, stats.recycled, stats.released), (0, 1, 1));
/// assert_eq!(pool.get(3).map(String::as_str), Some("row 3"));
/// ```
#[derive(Clone, Debug)]
pub struct ElementPool<E> {
    active: HashMap<usize, E>,
    free: Vec<E>,
    realized: Range<usize>,
}

impl<E> Default for ElementPool<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ElementPool<E> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            free: Vec::new(),
            realized: 0..0,
        }
    }

    /// Number of realized elements.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of parked elements available for reuse.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Range passed to the most recent [`ElementPool::sync`].
    #[must_use]
    pub fn realized(&self) -> Range<usize> {
        self.realized.clone()
    }

    /// Returns the element realized for `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&E> {
        self.active.get(&index)
    }

    /// Returns the element realized for `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut E> {
        self.active.get_mut(&index)
    }

    /// Reconciles realized elements with `range`.
    pub fn sync(
        &mut self,
        range: Range<usize>,
        mut realize: impl FnMut(usize, Option<E>) -> E,
        mut release: impl FnMut(&mut E),
    ) -> PoolStats {
        let mut stats = PoolStats::default();

        let leaving: Vec<usize> = self
            .active
            .keys()
            .copied()
            .filter(|i| !range.contains(i))
            .collect();
        for index in leaving {
            if let Some(mut element) = self.active.remove(&index) {
                release(&mut element);
                self.free.push(element);
                stats.released += 1;
            }
        }

        for index in range.clone() {
            if self.active.contains_key(&index) {
                continue;
            }
            let recycled = self.free.pop();
            if recycled.is_some() {
                stats.recycled += 1;
            } else {
                stats.created += 1;
            }
            let element = realize(index, recycled);
            self.active.insert(index, element);
        }

        self.realized = range;
        stats
    }

    /// Releases every realized element to the free list.
    pub fn invalidate(&mut self, mut release: impl FnMut(&mut E)) {
        for (_, mut element) in self.active.drain() {
            release(&mut element);
            self.free.push(element);
        }
        self.realized = 0..0;
    }

    /// Removes and returns every element, realized or parked.
    pub fn drain(&mut self) -> Vec<E> {
        let mut all: Vec<E> = self.active.drain().map(|(_, e)| e).collect();
        all.append(&mut self.free);
        self.realized = 0..0;
        all
    }
}
