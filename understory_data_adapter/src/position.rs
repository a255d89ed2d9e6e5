// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use understory_collection::Keyed;

use crate::config::Strategy;
use crate::query::ReadOptions;
use crate::response::{NextHint, ResponseMeta};

/// Address of one range of the remote dataset.
///
/// The three shapes are mutually exclusive; an adapter only produces the one
/// matching its [`Strategy`]. Positions are hashable so they can key
/// in-flight bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// Cursor strategy. `cursor` is `None` for the first range.
    Cursor {
        /// Server-issued continuation token.
        cursor: Option<String>,
        /// Range size.
        limit: u32,
    },
    /// Offset strategy.
    Offset {
        /// Index of the first row.
        offset: u64,
        /// Range size.
        limit: u32,
    },
    /// Page strategy.
    Page {
        /// 1-based page number.
        page: u32,
        /// Page size.
        per_page: u32,
    },
}

impl Position {
    /// The strategy this position belongs to.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Cursor { .. } => Strategy::Cursor,
            Self::Offset { .. } => Strategy::Offset,
            Self::Page { .. } => Strategy::Page,
        }
    }

    /// Number of items requested.
    #[must_use]
    pub fn size(&self) -> u32 {
        match *self {
            Self::Cursor { limit, .. } | Self::Offset { limit, .. } => limit,
            Self::Page { per_page, .. } => per_page,
        }
    }

    /// Logical index of the first item in this range, when addressable.
    ///
    /// Cursor positions are opaque and return `None`.
    #[must_use]
    pub fn start_index(&self) -> Option<u64> {
        match *self {
            Self::Cursor { .. } => None,
            Self::Offset { offset, .. } => Some(offset),
            Self::Page { page, per_page } => {
                Some(u64::from(page.saturating_sub(1)) * u64::from(per_page))
            }
        }
    }

    /// The range containing logical index `index`.
    ///
    /// Returns `None` for the cursor strategy, which cannot address an index.
    #[must_use]
    pub fn containing(strategy: Strategy, index: u64, size: u32) -> Option<Self> {
        let size = size.max(1);
        match strategy {
            Strategy::Cursor => None,
            Strategy::Offset => Some(Self::Offset {
                offset: index - index % u64::from(size),
                limit: size,
            }),
            Strategy::Page => {
                let page = index / u64::from(size) + 1;
                Some(Self::Page {
                    page: u32::try_from(page).unwrap_or(u32::MAX),
                    per_page: size,
                })
            }
        }
    }

    /// Request options selecting this range.
    #[must_use]
    pub fn to_options(&self) -> ReadOptions {
        match self {
            Self::Cursor { cursor, limit } => ReadOptions {
                cursor: cursor.clone(),
                limit: Some(*limit),
                ..ReadOptions::default()
            },
            Self::Offset { offset, limit } => ReadOptions {
                offset: Some(*offset),
                limit: Some(*limit),
                ..ReadOptions::default()
            },
            Self::Page { page, per_page } => ReadOptions {
                page: Some(*page),
                per_page: Some(*per_page),
                ..ReadOptions::default()
            },
        }
    }

    /// The range after this one, given what reading this one produced.
    ///
    /// Returns `None` when `meta` reports no further range.
    #[must_use]
    pub fn next(&self, meta: &PageMeta, returned: usize) -> Option<Self> {
        if !meta.has_next {
            return None;
        }
        match self {
            Self::Cursor { limit, .. } => meta.cursor.as_ref().map(|cursor| Self::Cursor {
                cursor: Some(cursor.clone()),
                limit: *limit,
            }),
            Self::Offset { offset, limit } => Some(Self::Offset {
                offset: offset + returned as u64,
                limit: *limit,
            }),
            Self::Page { page, per_page } => Some(Self::Page {
                page: page + 1,
                per_page: *per_page,
            }),
        }
    }

    /// The range before this one, if the strategy can address it.
    #[must_use]
    pub fn prev(&self) -> Option<Self> {
        match *self {
            Self::Cursor { .. } => None,
            Self::Offset { offset, limit } => (offset > 0).then(|| Self::Offset {
                offset: offset.saturating_sub(u64::from(limit)),
                limit,
            }),
            Self::Page { page, per_page } => (page > 1).then(|| Self::Page {
                page: page - 1,
                per_page,
            }),
        }
    }
}

/// Normalized pagination metadata for one read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Continuation token for the next range (cursor strategy).
    pub cursor: Option<String>,
    /// Whether a further range exists.
    pub has_next: bool,
    /// Total number of items, when the server reports one.
    pub total: Option<u64>,
    /// Page number that was read (page strategy).
    pub page: Option<u32>,
    /// Total number of pages, reported or derived from `total`.
    pub pages: Option<u32>,
    /// Offset that was read (offset strategy).
    pub offset: Option<u64>,
}

impl PageMeta {
    /// Combines the server's hints with what the read at `position` returned.
    pub(crate) fn resolve<T: Keyed>(position: &Position, hints: &ResponseMeta, items: &[T]) -> Self {
        let returned = items.len();
        let mut meta = Self {
            total: hints.total,
            ..Self::default()
        };
        match position {
            Position::Cursor { limit, .. } => match &hints.next {
                NextHint::Token(token) => {
                    meta.has_next = hints.has_next.unwrap_or(true);
                    meta.cursor = meta.has_next.then(|| token.clone());
                }
                NextHint::End => meta.has_next = false,
                NextHint::Absent => {
                    meta.has_next = returned > 0
                        && hints.has_next.unwrap_or(returned >= *limit as usize);
                    meta.cursor = meta
                        .has_next
                        .then(|| items.last().map(|item| item.id().to_owned()))
                        .flatten();
                }
            },
            Position::Offset { offset, limit } => {
                meta.offset = Some(*offset);
                meta.has_next = match hints.total {
                    Some(total) => offset + (returned as u64) < total,
                    None => hints.has_next.unwrap_or(returned >= *limit as usize),
                };
            }
            Position::Page { page, per_page } => {
                meta.page = Some(*page);
                meta.pages = hints.pages.or_else(|| {
                    hints.total.map(|total| {
                        let pages = total.div_ceil(u64::from((*per_page).max(1)));
                        u32::try_from(pages).unwrap_or(u32::MAX)
                    })
                });
                meta.has_next = match meta.pages {
                    Some(pages) => *page < pages,
                    None => hints.has_next.unwrap_or(returned >= *per_page as usize),
                };
            }
        }
        meta
    }
}

/// Normalized result of one read or write.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
    aborted: bool,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self {
            items,
            meta,
            aborted: false,
        }
    }

    /// The benign result of a cancelled request: no items, no next range.
    #[must_use]
    pub fn aborted() -> Self {
        Self {
            items: Vec::new(),
            meta: PageMeta::default(),
            aborted: true,
        }
    }

    /// Returns `true` if the request was cancelled before completing.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}
