// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cmp::Ordering;
use core::error::Error;
use core::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::CollectionError;
use crate::event::{EventData, EventKind, Notification, Observer, Subscription, emit};
use crate::Keyed;

type Filter<T> = Box<dyn Fn(&T) -> bool>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;
type Validator<T> = Box<dyn Fn(&T) -> bool>;
type Transform<T> = Box<dyn Fn(T) -> T>;

/// Observable store of uniquely keyed items.
///
/// See the [crate documentation](crate) for an overview.
pub struct Collection<T> {
    items: IndexMap<String, T>,
    filter: Option<Filter<T>>,
    comparator: Option<Comparator<T>>,
    validator: Option<Validator<T>>,
    transform: Option<Transform<T>>,
    observers: Vec<(Subscription, Observer<T>)>,
    next_subscription: u64,
    loading: bool,
    last_error: Option<String>,
    revision: u64,
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.items.len())
            .field("filtered", &self.filter.is_some())
            .field("sorted", &self.comparator.is_some())
            .field("observers", &self.observers.len())
            .field("loading", &self.loading)
            .field("last_error", &self.last_error)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> {
    /// Creates an empty collection with no validator, transform, filter, or sort.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            filter: None,
            comparator: None,
            validator: None,
            transform: None,
            observers: Vec::new(),
            next_subscription: 0,
            loading: false,
            last_error: None,
            revision: 0,
        }
    }

    /// Sets the predicate every incoming item must satisfy.
    #[must_use]
    pub fn with_validator(mut self, validate: impl Fn(&T) -> bool + 'static) -> Self {
        self.validator = Some(Box::new(validate));
        self
    }

    /// Sets a function applied to every incoming item after validation.
    #[must_use]
    pub fn with_transform(mut self, transform: impl Fn(T) -> T + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Number of stored items, ignoring the active filter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` while a mutation is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Counter bumped by every successful mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if an item with `id` is stored.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Returns the item stored under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    /// Stored ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// The read view: stored items with the filter and comparator applied.
    ///
    /// The comparator sort is stable, so items that compare equal keep
    /// insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<&T> {
        let mut view: Vec<&T> = match &self.filter {
            Some(filter) => self.items.values().filter(|item| filter(item)).collect(),
            None => self.items.values().collect(),
        };
        if let Some(cmp) = &self.comparator {
            view.sort_by(|a, b| cmp(a, b));
        }
        view
    }

    /// Replaces the active filter; `items()` only yields items it accepts.
    pub fn query(&mut self, predicate: impl Fn(&T) -> bool + 'static) {
        self.filter = Some(Box::new(predicate));
        self.notify(EventKind::Change, EventData::None);
    }

    /// Replaces the active comparator used to order `items()`.
    pub fn sort(&mut self, comparator: impl Fn(&T, &T) -> Ordering + 'static) {
        self.comparator = Some(Box::new(comparator));
        self.notify(EventKind::Change, EventData::None);
    }

    /// Registers an observer for every event kind.
    pub fn subscribe(&mut self, observer: impl FnMut(&Notification<'_, T>) + 'static) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((subscription, Box::new(observer)));
        subscription
    }

    /// Removes an observer. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(s, _)| *s != subscription);
        self.observers.len() != before
    }

    /// Drops every observer.
    pub fn clear_subscriptions(&mut self) {
        self.observers.clear();
    }

    /// Publishes a foreign error on the `error` channel and records it.
    ///
    /// Owners use this to route adapter and transport failures through the
    /// same feed as collection errors.
    pub fn report_error(&mut self, error: &(dyn Error + 'static)) {
        self.last_error = Some(error.to_string());
        self.notify(EventKind::Error, EventData::Error(error));
    }

    /// Empties storage and resets the filter and comparator.
    pub fn clear(&mut self) {
        self.set_loading(true);
        self.items.clear();
        self.filter = None;
        self.comparator = None;
        self.revision += 1;
        self.notify(EventKind::Change, EventData::None);
        self.set_loading(false);
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.notify(EventKind::Loading, EventData::Loading(loading));
        }
    }

    fn notify(&mut self, event: EventKind, data: EventData<'_, T>) {
        emit(&mut self.observers, &Notification { event, data });
    }

    /// Runs a mutation between loading notifications and routes its error.
    fn guarded<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, CollectionError>,
    ) -> Result<R, CollectionError> {
        self.set_loading(true);
        let result = op(self);
        if let Err(err) = &result {
            debug!(error = %err, "collection mutation rejected");
            self.report_error(err);
        }
        self.set_loading(false);
        result
    }

    fn admit(&self, item: T) -> Result<(String, T), CollectionError>
    where
        T: Keyed,
    {
        if item.id().is_empty() {
            return Err(CollectionError::MissingId);
        }
        if let Some(validate) = &self.validator {
            if !validate(&item) {
                return Err(CollectionError::Validation {
                    id: item.id().to_owned(),
                });
            }
        }
        let item = match &self.transform {
            Some(transform) => transform(item),
            None => item,
        };
        if item.id().is_empty() {
            return Err(CollectionError::MissingId);
        }
        Ok((item.id().to_owned(), item))
    }

    fn admit_batch(
        &self,
        items: impl IntoIterator<Item = T>,
    ) -> Result<Vec<(String, T)>, CollectionError>
    where
        T: Keyed,
    {
        let mut seen = IndexSet::new();
        let mut batch = Vec::new();
        for item in items {
            let (id, item) = self.admit(item)?;
            if !seen.insert(id.clone()) {
                return Err(CollectionError::DuplicateId(id));
            }
            batch.push((id, item));
        }
        Ok(batch)
    }

    /// Writes `batch`, then emits `event` with the written items.
    fn commit(&mut self, event: EventKind, batch: Vec<(String, T)>) {
        if batch.is_empty() {
            return;
        }
        let ids: Vec<String> = batch.iter().map(|(id, _)| id.clone()).collect();
        for (id, item) in batch {
            self.items.insert(id, item);
        }
        let written: Vec<&T> = ids.iter().filter_map(|id| self.items.get(id)).collect();
        emit(
            &mut self.observers,
            &Notification {
                event,
                data: EventData::Items(&written),
            },
        );
    }
}

impl<T: Keyed> Collection<T> {
    /// Inserts new items.
    ///
    /// Each item is validated, transformed, and checked for a non-empty id
    /// that is neither stored nor repeated within the batch. The batch is
    /// atomic: if any item fails, nothing is inserted. Emits `add` then
    /// `change`.
    pub fn add(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), CollectionError> {
        self.guarded(|this| {
            let batch = this.admit_batch(items)?;
            if let Some((id, _)) = batch.iter().find(|(id, _)| this.items.contains_key(id)) {
                return Err(CollectionError::DuplicateId(id.clone()));
            }
            if batch.is_empty() {
                return Ok(());
            }
            this.commit(EventKind::Add, batch);
            this.revision += 1;
            this.notify(EventKind::Change, EventData::None);
            Ok(())
        })
    }

    /// Replaces existing items.
    ///
    /// Every id must already be stored; the batch is atomic. Emits `update`
    /// then `change`.
    pub fn update(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), CollectionError> {
        self.guarded(|this| {
            let batch = this.admit_batch(items)?;
            if let Some((id, _)) = batch.iter().find(|(id, _)| !this.items.contains_key(id)) {
                return Err(CollectionError::NotFound(id.clone()));
            }
            if batch.is_empty() {
                return Ok(());
            }
            this.commit(EventKind::Update, batch);
            this.revision += 1;
            this.notify(EventKind::Change, EventData::None);
            Ok(())
        })
    }

    /// Inserts new items and routes already stored ids to an update.
    ///
    /// Emits `add` and/or `update` for the respective parts, then a single
    /// `change`.
    pub fn upsert(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), CollectionError> {
        self.guarded(|this| {
            let batch = this.admit_batch(items)?;
            if batch.is_empty() {
                return Ok(());
            }
            let (existing, fresh): (Vec<_>, Vec<_>) =
                batch.into_iter().partition(|(id, _)| this.items.contains_key(id));
            this.commit(EventKind::Add, fresh);
            this.commit(EventKind::Update, existing);
            this.revision += 1;
            this.notify(EventKind::Change, EventData::None);
            Ok(())
        })
    }

    /// Swaps the stored items for `items` and resets the filter and
    /// comparator.
    ///
    /// The batch is admitted like [`add`](Self::add) against an empty
    /// store; if any item fails, the current items stay. Emits `add` then
    /// `change`.
    pub fn replace(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), CollectionError> {
        self.guarded(|this| {
            let batch = this.admit_batch(items)?;
            this.items.clear();
            this.filter = None;
            this.comparator = None;
            this.commit(EventKind::Add, batch);
            this.revision += 1;
            this.notify(EventKind::Change, EventData::None);
            Ok(())
        })
    }

    /// Removes items by id.
    ///
    /// Every id must be stored; the batch is atomic. Emits `remove` then
    /// `change`.
    pub fn remove<I, S>(&mut self, ids: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guarded(|this| {
            let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
            if let Some(id) = ids.iter().find(|id| !this.items.contains_key(id.as_str())) {
                return Err(CollectionError::NotFound(id.clone()));
            }
            if ids.is_empty() {
                return Ok(());
            }
            for id in &ids {
                this.items.shift_remove(id);
            }
            this.revision += 1;
            this.notify(EventKind::Remove, EventData::Ids(&ids));
            this.notify(EventKind::Change, EventData::None);
            Ok(())
        })
    }
}
