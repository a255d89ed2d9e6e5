// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `overstory_list` crate.
//!
//! These drive a [`ListManager`] against the in-memory paged server from
//! `understory_data_adapter::testing`: pagination walks, merge policy,
//! stale and duplicate loads, failures, and teardown.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use overstory_list::{
    Direction, FrameChanges, ItemRenderer, ListConfig, ListError, ListManager, ListSource,
    LoadKind, LoadOutcome, LoadPhase, LoadStatus, ScrollContainer,
};
use serde_json::json;
use understory_collection::{CollectionError, EventData, Keyed, Notification};
use understory_data_adapter::testing::MockTransport;
use understory_data_adapter::{
    AdapterConfig, AdapterError, Position, Record, Response, RestAdapter, Strategy,
};
use understory_virtual_list::{ExtentSource, PoolStats};
use web_time::Instant;

#[derive(Debug)]
struct FakeContainer {
    top: f64,
    height: f64,
    spacer: f64,
    spacer_writes: Vec<f64>,
}

impl FakeContainer {
    fn new(height: f64) -> Self {
        Self {
            top: 0.0,
            height,
            spacer: 0.0,
            spacer_writes: Vec::new(),
        }
    }
}

impl ScrollContainer for FakeContainer {
    fn scroll_top(&self) -> f64 {
        self.top
    }

    fn client_height(&self) -> f64 {
        self.height
    }

    fn scroll_height(&self) -> f64 {
        self.spacer.max(self.height)
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        self.top = scroll_top;
    }

    fn set_spacer_extent(&mut self, extent: f64) {
        self.spacer = extent;
        self.spacer_writes.push(extent);
    }
}

#[derive(Debug, Default)]
struct Recorder {
    created: usize,
    updated: usize,
    released: usize,
}

impl ItemRenderer<Record> for Recorder {
    type Element = String;

    fn create(&mut self, _: usize, item: &Record) -> String {
        self.created += 1;
        item.id().to_owned()
    }

    fn update(&mut self, label: &mut String, _: usize, item: &Record) {
        self.updated += 1;
        label.clear();
        label.push_str(item.id());
    }

    fn release(&mut self, _: &mut String) {
        self.released += 1;
    }
}

type List = ListManager<Record, FakeContainer, Recorder>;

fn remote(strategy: Strategy, total: usize, page_size: u32, config: ListConfig) -> (List, Rc<MockTransport>) {
    let transport = Rc::new(MockTransport::paged(total));
    let adapter_config = AdapterConfig::new("https://api.test", "items")
        .with_strategy(strategy)
        .with_page_size(page_size);
    let adapter: RestAdapter<Record, _> = RestAdapter::new(adapter_config, Rc::clone(&transport));
    let list = ListManager::new(
        config,
        ListSource::remote(adapter),
        FakeContainer::new(400.0),
        Recorder::default(),
    );
    (list, transport)
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| serde_json::from_value(json!({ "id": format!("item-{i}"), "index": i })).unwrap())
        .collect()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(flavor = "current_thread")]
async fn every_strategy_walks_each_item_once() {
    for strategy in [Strategy::Page, Strategy::Offset, Strategy::Cursor] {
        let (mut list, transport) = remote(strategy, 45, 20, ListConfig::default());
        list.initialize().await.unwrap();
        while list.state().has_next() {
            let outcome = list.load_next().await.unwrap();
            assert!(
                matches!(outcome, LoadOutcome::Applied { .. }),
                "{strategy:?}: {outcome:?}"
            );
        }
        let expected: Vec<String> = (0..45).map(|i| format!("item-{i}")).collect();
        assert_eq!(list.state().ids(), expected.as_slice(), "{strategy:?}");
        assert_eq!(transport.calls(), 3, "{strategy:?}");
        assert_eq!(list.load_next().await.unwrap(), LoadOutcome::Exhausted);
    }
}

#[tokio::test(flavor = "current_thread")]
async fn initialize_preloads_until_the_data_ends() {
    let config = ListConfig::default().with_initial_ranges(3);
    let (mut list, transport) = remote(Strategy::Page, 100, 20, config.clone());
    list.initialize().await.unwrap();
    assert_eq!(list.state().len(), 60);
    assert_eq!(transport.calls(), 3);

    let (mut short, transport) = remote(Strategy::Page, 30, 20, config);
    short.initialize().await.unwrap();
    assert_eq!(short.state().len(), 30);
    assert!(!short.state().has_next());
    assert_eq!(transport.calls(), 2);
}

fn overlapping_page() -> Response {
    let body = json!({
        "items": [{ "id": "item-19" }, { "id": "item-20" }, { "id": "item-20" }],
        "meta": { "total": 40, "pages": 2 },
    });
    Response::new(200, body.to_string())
}

#[tokio::test(flavor = "current_thread")]
async fn overlapping_pages_are_deduplicated() {
    let (mut list, transport) = remote(Strategy::Page, 40, 20, ListConfig::default());
    list.initialize().await.unwrap();
    transport.push_response(overlapping_page());

    assert_eq!(list.load_next().await.unwrap(), LoadOutcome::Applied { added: 1 });
    assert_eq!(list.state().len(), 21);
    assert_eq!(list.collection().len(), 21);
    assert_eq!(list.state().ids().last().map(String::as_str), Some("item-20"));
}

#[tokio::test(flavor = "current_thread")]
async fn without_dedupe_every_returned_item_is_placed() {
    let config = ListConfig::default().with_dedupe(false);
    let (mut list, transport) = remote(Strategy::Page, 40, 20, config);
    list.initialize().await.unwrap();
    transport.push_response(overlapping_page());

    assert_eq!(list.load_next().await.unwrap(), LoadOutcome::Applied { added: 3 });
    assert_eq!(list.state().len(), 23);
    assert_eq!(list.collection().len(), 21, "storage holds one entry per id");
}

#[tokio::test(flavor = "current_thread")]
async fn empty_jump_keeps_the_current_window() {
    let (mut list, transport) = remote(Strategy::Page, 50, 50, ListConfig::default());
    list.initialize().await.unwrap();
    assert_eq!(list.state().len(), 50);
    let generation = list.generation();

    assert_eq!(list.jump_to_page(3).await.unwrap(), LoadOutcome::Preserved);
    assert_eq!(transport.last_param("page").as_deref(), Some("3"));
    assert_eq!(list.state().len(), 50);
    assert_eq!(list.state().window_offset(), 0);
    assert_eq!(list.item(0).map(Keyed::id), Some("item-0"));
    assert_eq!(list.generation(), generation + 1);
    assert_eq!(list.phase(), LoadPhase::Idle);
}

#[tokio::test(flavor = "current_thread")]
async fn jump_replaces_the_window_and_extends_backwards() {
    let (mut list, _) = remote(Strategy::Page, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();

    assert_eq!(list.jump_to_page(5).await.unwrap(), LoadOutcome::Applied { added: 20 });
    let state = list.state();
    assert_eq!(state.window_offset(), 80);
    assert_eq!(state.ids().first().map(String::as_str), Some("item-80"));
    assert_eq!(state.prev_position(), Some(&Position::Page { page: 4, per_page: 20 }));
    assert_eq!(state.next_position(), Some(&Position::Page { page: 6, per_page: 20 }));
    assert_eq!(list.container().top, 80.0 * 48.0);
    assert_eq!(list.container().spacer, 500.0 * 48.0);
    assert_eq!(list.item(85).map(Keyed::id), Some("item-85"));
    assert_eq!(list.item(20), None);

    assert_eq!(list.load_prev().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().window_offset(), 60);
    assert_eq!(list.state().len(), 40);
    assert_eq!(list.item(60).map(Keyed::id), Some("item-60"));
    assert_eq!(list.item(99).map(Keyed::id), Some("item-99"));
}

#[tokio::test(flavor = "current_thread")]
async fn rejected_jump_keeps_the_current_window() {
    let (mut list, transport) = remote(Strategy::Page, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();
    let body = json!({
        "items": [{ "id": "x-1" }, { "name": "no id" }],
        "meta": { "total": 500, "pages": 25 },
    });
    transport.push_response(Response::new(200, body.to_string()));

    assert_eq!(
        list.jump_to_page(5).await,
        Err(ListError::Collection(CollectionError::MissingId))
    );
    assert_eq!(list.state().len(), 20);
    assert_eq!(list.state().window_offset(), 0);
    assert_eq!(list.item(0).map(Keyed::id), Some("item-0"));
    assert_eq!(list.collection().len(), 20);
    assert!(!list.collection().contains("x-1"));
    assert_eq!(list.phase(), LoadPhase::Failed);
    assert_eq!(list.debug_info().failed, Some(LoadKind::Jump));
}

#[tokio::test(flavor = "current_thread")]
async fn prepended_window_starts_at_the_page_start() {
    let (mut list, transport) = remote(Strategy::Page, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();
    list.jump_to_page(5).await.unwrap();

    // Page 4 repeats `item-80`, which the window already holds.
    let mut items: Vec<_> = (60..79).map(|i| json!({ "id": format!("item-{i}") })).collect();
    items.push(json!({ "id": "item-80" }));
    let body = json!({ "items": items, "meta": { "total": 500, "pages": 25 } });
    transport.push_response(Response::new(200, body.to_string()));

    assert_eq!(list.load_prev().await.unwrap(), LoadOutcome::Applied { added: 19 });
    assert_eq!(list.state().window_offset(), 60);
    assert_eq!(list.item(60).map(Keyed::id), Some("item-60"));
    assert_eq!(list.item(78).map(Keyed::id), Some("item-78"));

    assert_eq!(list.load_prev().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().window_offset(), 40);
    assert_eq!(list.item(40).map(Keyed::id), Some("item-40"));
}

#[tokio::test(flavor = "current_thread")]
async fn completion_from_before_a_jump_is_discarded() {
    let (mut list, _) = remote(Strategy::Page, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();

    let stale = list.begin_next().unwrap().expect("page 2 is available");
    let stale = stale.fetch().await;
    assert_eq!(list.jump_to_page(5).await.unwrap(), LoadOutcome::Applied { added: 20 });

    assert_eq!(list.apply(stale).unwrap(), LoadOutcome::Blocked);
    assert_eq!(list.phase(), LoadPhase::Blocked);
    assert_eq!(list.state().window_offset(), 80);
    assert_eq!(list.state().len(), 20);
    assert!(!list.collection().contains("item-20"));
}

#[tokio::test(flavor = "current_thread")]
async fn duplicate_and_already_loaded_ranges_are_not_requested() {
    let (mut list, transport) = remote(Strategy::Page, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();

    let first = list.begin_next().unwrap().expect("page 2 is available");
    assert!(list.begin_next().unwrap().is_none(), "same range in flight");
    assert_eq!(list.debug_info().in_flight, 1);
    assert!(list.state().is_loading());
    assert_eq!(list.phase(), LoadPhase::Requesting);

    let done = first.fetch().await;
    assert_eq!(list.apply(done).unwrap(), LoadOutcome::Applied { added: 20 });
    assert!(!list.state().is_loading());
    assert_eq!(list.phase(), LoadPhase::Idle);

    let page_one = Position::Page { page: 1, per_page: 20 };
    let outcome = list
        .load(LoadKind::Boundary(Direction::Forward), page_one)
        .await
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Blocked);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn frames_track_the_scroll_offset() {
    let config = ListConfig::default().with_item_height(40.0);
    let mut list = ListManager::new(
        config,
        ListSource::Static(records(1000)),
        FakeContainer::new(400.0),
        Recorder::default(),
    );
    list.initialize().await.unwrap();
    let range = list.state().visible_range();
    assert_eq!(range.visible(), 0..10);
    assert_eq!(range.realized(), 0..13);
    assert_eq!(list.renderer().created, 13);
    assert_eq!(list.container().spacer, 40_000.0);

    list.container_mut().top = 800.0;
    let t0 = Instant::now();
    assert!(list.on_scroll(t0));
    assert!(!list.on_scroll(t0 + ms(4)), "one frame per burst");

    let frame = list.on_frame(t0 + ms(16));
    assert!(frame.changes.contains(FrameChanges::RANGE));
    assert_eq!(frame.range.visible(), 20..30);
    assert_eq!(frame.range.realized(), 17..33);
    assert_eq!(
        frame.render,
        PoolStats {
            created: 3,
            recycled: 13,
            released: 13,
        }
    );
    assert!(frame.load.is_none(), "static lists never load");
    assert!(frame.reschedule);
    assert_eq!(list.element(20).map(String::as_str), Some("item-20"));
    assert_eq!(list.element(5), None);

    let settled = list.on_frame(t0 + ms(400));
    assert!(settled.changes.contains(FrameChanges::SCROLL_END));
    assert!(!settled.changes.contains(FrameChanges::RANGE));
    assert!(!settled.reschedule);
    assert_eq!(list.next_deadline(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn boundary_failure_keeps_items_and_pauses_loading() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    list.subscribe(move |n: &Notification<'_, Record>| {
        if let EventData::Error(err) = &n.data {
            sink.borrow_mut().push(err.to_string());
        }
    });
    list.initialize().await.unwrap();

    transport.push_network_error("connection reset");
    list.container_mut().top = 600.0;
    let t0 = Instant::now();
    list.on_scroll(t0);
    let ticket = list.on_frame(t0).load.expect("range is near the window end");
    assert_eq!(ticket.kind(), LoadKind::Boundary(Direction::Forward));

    assert_eq!(list.apply(ticket.fetch().await).unwrap(), LoadOutcome::Failed);
    assert_eq!(list.state().len(), 20);
    assert_eq!(list.phase(), LoadPhase::Failed);
    assert_eq!(errors.borrow().len(), 1);
    assert!(list.collection().last_error().is_some());

    list.on_scroll(t0 + ms(16));
    assert!(list.on_frame(t0 + ms(16)).load.is_none(), "paused after a failure");

    assert_eq!(list.retry().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().len(), 40);
    assert!(list.debug_info().failed.is_none());
    list.container_mut().top = 1400.0;
    assert!(list.on_frame(t0 + ms(32)).load.is_some(), "resumed after retry");
}

#[tokio::test(flavor = "current_thread")]
async fn rejected_boundary_items_pause_loading() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    let errors = Rc::new(Cell::new(0));
    let sink = Rc::clone(&errors);
    list.subscribe(move |n: &Notification<'_, Record>| {
        if matches!(n.data, EventData::Error(_)) {
            sink.set(sink.get() + 1);
        }
    });
    list.initialize().await.unwrap();

    let body = json!({
        "items": [{ "id": "item-20" }, { "name": "no id" }],
        "meta": { "total": 100, "pages": 5 },
    });
    transport.push_response(Response::new(200, body.to_string()));
    list.container_mut().top = 600.0;
    let t0 = Instant::now();
    list.on_scroll(t0);
    let ticket = list.on_frame(t0).load.expect("range is near the window end");

    assert_eq!(list.apply(ticket.fetch().await), Ok(LoadOutcome::Failed));
    assert_eq!(list.phase(), LoadPhase::Failed);
    assert_eq!(
        list.debug_info().failed,
        Some(LoadKind::Boundary(Direction::Forward))
    );
    assert_eq!(list.state().len(), 20);
    assert!(!list.collection().contains("item-20"));
    assert_eq!(errors.get(), 1);

    list.on_scroll(t0 + ms(16));
    assert!(list.on_frame(t0 + ms(16)).load.is_none(), "paused after a rejection");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn visible_failures_are_returned_and_retryable() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    transport.push_network_error("offline");
    let err = list.initialize().await.unwrap_err();
    assert!(matches!(err, ListError::Adapter(AdapterError::Network(_))));
    assert!(list.state().is_empty());

    assert_eq!(list.retry().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().len(), 20);

    transport.push_network_error("offline");
    let err = list.jump_to_page(3).await.unwrap_err();
    assert!(matches!(err, ListError::Adapter(AdapterError::Network(_))));
    assert_eq!(list.state().window_offset(), 0);
    assert_eq!(list.state().len(), 20);

    assert_eq!(list.retry().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().window_offset(), 40);
    assert_eq!(list.container().top, 40.0 * 48.0);
}

#[tokio::test(flavor = "current_thread")]
async fn estimated_spacer_never_shrinks_while_loading() {
    let (mut list, _) = remote(Strategy::Cursor, 100, 20, ListConfig::default());
    list.initialize().await.unwrap();
    assert_eq!(list.container().spacer, 20.0 * 48.0);
    assert_eq!(list.debug_info().spacer_source, ExtentSource::Estimated);

    list.load_next().await.unwrap();
    list.load_next().await.unwrap();
    assert_eq!(list.container().spacer, 60.0 * 48.0);
    let writes = &list.container().spacer_writes;
    assert!(writes.windows(2).all(|w| w[0] <= w[1]), "{writes:?}");
}

#[tokio::test(flavor = "current_thread")]
async fn exact_spacer_holds_while_scrolled_past_a_smaller_total() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    list.initialize().await.unwrap();
    assert_eq!(list.container().spacer, 100.0 * 48.0);

    // The server now reports only 30 items in total.
    let items: Vec<_> = (20..40).map(|i| json!({ "id": format!("item-{i}") })).collect();
    let body = json!({ "items": items, "meta": { "total": 30, "pages": 2 } });
    transport.push_response(Response::new(200, body.to_string()));
    list.container_mut().top = 4_000.0;
    let t0 = Instant::now();
    list.on_scroll(t0);
    let ticket = list.on_frame(t0).load.expect("range is past the window end");

    assert_eq!(
        list.apply(ticket.fetch().await).unwrap(),
        LoadOutcome::Applied { added: 20 }
    );
    assert_eq!(list.state().total_count(), Some(30));
    assert_eq!(list.container().spacer, 100.0 * 48.0);
    assert_eq!(list.debug_info().spacer_source, ExtentSource::Exact);

    list.container_mut().top = 0.0;
    list.on_scroll(t0 + ms(16));
    let frame = list.on_frame(t0 + ms(16));
    assert!(frame.changes.contains(FrameChanges::SPACER));
    assert_eq!(list.container().spacer, 40.0 * 48.0);
}

#[tokio::test(flavor = "current_thread")]
async fn cursor_lists_cannot_jump() {
    let (mut list, _) = remote(Strategy::Cursor, 100, 20, ListConfig::default());
    list.initialize().await.unwrap();
    assert_eq!(list.jump_to_page(2).await, Err(ListError::Unaddressable));
    assert_eq!(list.scroll_to_index(70).await, Err(ListError::Unaddressable));
    assert_eq!(list.scroll_to_index(5).await, Ok(LoadOutcome::InWindow));
}

#[tokio::test(flavor = "current_thread")]
async fn scroll_to_index_jumps_to_the_containing_range() {
    let (mut list, transport) = remote(Strategy::Offset, 500, 20, ListConfig::default());
    list.initialize().await.unwrap();

    assert_eq!(list.scroll_to_index(10).await.unwrap(), LoadOutcome::InWindow);
    assert_eq!(list.container().top, 480.0);

    assert_eq!(list.scroll_to_index(250).await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(transport.last_param("offset").as_deref(), Some("240"));
    assert_eq!(list.state().window_offset(), 240);
    assert_eq!(list.container().top, 250.0 * 48.0);
    assert_eq!(list.item(250).map(Keyed::id), Some("item-250"));
}

#[tokio::test(flavor = "current_thread")]
async fn refresh_reloads_from_the_source() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    list.initialize().await.unwrap();
    list.load_next().await.unwrap();
    list.container_mut().top = 500.0;

    assert_eq!(list.refresh().await.unwrap(), LoadOutcome::Applied { added: 20 });
    assert_eq!(list.state().len(), 20);
    assert_eq!(list.container().top, 0.0);
    assert_eq!(transport.calls(), 3, "refresh bypasses the response cache");
}

#[tokio::test(flavor = "current_thread")]
async fn after_load_sees_fresh_and_total_items() {
    let (mut list, _) = remote(Strategy::Page, 30, 20, ListConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    list.after_load(move |status: &LoadStatus<'_, Record>| {
        sink.borrow_mut()
            .push((status.items.len(), status.all_items.len(), status.has_next));
    });
    list.initialize().await.unwrap();
    list.load_next().await.unwrap();
    assert_eq!(*seen.borrow(), [(20, 20, true), (10, 30, false)]);
}

#[tokio::test(flavor = "current_thread")]
async fn destroy_aborts_loads_and_is_idempotent() {
    let (mut list, transport) = remote(Strategy::Page, 100, 20, ListConfig::default());
    list.initialize().await.unwrap();
    let events = Rc::new(Cell::new(0_usize));
    let counter = Rc::clone(&events);
    list.subscribe(move |_: &Notification<'_, Record>| counter.set(counter.get() + 1));
    assert_eq!(list.collection().observer_count(), 1);
    assert_eq!(list.renderer().created, 12);

    transport.set_stalled(true);
    let ticket = list.begin_next().unwrap().expect("page 2 is available");
    let (completion, ()) = tokio::join!(ticket.fetch(), async {
        tokio::task::yield_now().await;
        list.destroy();
    });

    assert_eq!(list.apply(completion), Err(ListError::Destroyed));
    list.destroy();
    assert!(list.is_destroyed());
    assert_eq!(list.collection().observer_count(), 0);
    assert_eq!(list.renderer().released, 12);
    assert_eq!(list.debug_info().active_elements, 0);
    assert_eq!(list.begin_next().unwrap_err(), ListError::Destroyed);
    assert!(!list.on_scroll(Instant::now()));
    assert_eq!(transport.calls(), 2);
    assert_eq!(events.get(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn static_lists_reject_remote_operations() {
    let mut list = ListManager::new(
        ListConfig::default(),
        ListSource::Static(records(5)),
        FakeContainer::new(400.0),
        Recorder::default(),
    );
    assert_eq!(list.begin_next().unwrap_err(), ListError::NotInitialized);
    list.initialize().await.unwrap();
    assert_eq!(list.state().total_count(), Some(5));
    assert_eq!(list.load_next().await, Err(ListError::StaticSource));
    assert_eq!(list.scroll_to_index(3).await, Ok(LoadOutcome::InWindow));
}
