// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_data_adapter` crate.
//!
//! These drive [`RestAdapter`] against the in-memory transport from the
//! `testing` module: caching, cancellation, strategies, and error bodies.

use core::time::Duration;
use std::rc::Rc;

use serde_json::{Value, json};
use understory_collection::Keyed;
use understory_data_adapter::testing::{ManualClock, MockTransport};
use understory_data_adapter::{
    AdapterConfig, AdapterError, DataAdapter, Method, NextHint, ParsedResponse, Position, Query,
    ReadOptions, Record, Response, ResponseMeta, RestAdapter, Strategy,
};

fn adapter(strategy: Strategy, transport: MockTransport) -> RestAdapter<Record, Rc<MockTransport>> {
    let config = AdapterConfig::new("https://api.test/v1", "items")
        .with_strategy(strategy)
        .with_page_size(10);
    RestAdapter::new(config, Rc::new(transport))
}

fn ids(page: &understory_data_adapter::Page<Record>) -> Vec<&str> {
    page.items.iter().map(Keyed::id).collect()
}

#[tokio::test(flavor = "current_thread")]
async fn same_url_within_ttl_hits_the_cache() {
    let clock = Rc::new(ManualClock::new());
    let adapter = adapter(Strategy::Page, MockTransport::paged(30)).with_clock(clock.clone());
    let q = Query::new();
    let opts = ReadOptions::default();

    adapter.read(&q, &opts).await.unwrap();
    clock.advance(Duration::from_secs(299));
    let cached = adapter.read(&q, &opts).await.unwrap();
    assert_eq!(adapter.transport().calls(), 1);
    assert_eq!(cached.items.len(), 10);

    clock.advance(Duration::from_secs(2));
    adapter.read(&q, &opts).await.unwrap();
    assert_eq!(adapter.transport().calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn disabled_cache_always_sends() {
    let config = AdapterConfig::new("https://api.test", "items").with_cache(false);
    let adapter: RestAdapter<Record, _> = RestAdapter::new(config, Rc::new(MockTransport::paged(5)));
    adapter.read(&Query::new(), &ReadOptions::default()).await.unwrap();
    adapter.read(&Query::new(), &ReadOptions::default()).await.unwrap();
    assert_eq!(adapter.transport().calls(), 2);
    assert_eq!(adapter.cached_responses(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn disconnect_resolves_outstanding_reads_without_caching() {
    let transport = MockTransport::paged(100);
    transport.set_stalled(true);
    let adapter = adapter(Strategy::Offset, transport);
    let q = Query::new();
    let at = |offset| ReadOptions {
        offset: Some(offset),
        ..ReadOptions::default()
    };
    let (o1, o2, o3) = (at(0), at(10), at(20));

    let (a, b, c, ()) = tokio::join!(
        adapter.read(&q, &o1),
        adapter.read(&q, &o2),
        adapter.read(&q, &o3),
        async {
            tokio::task::yield_now().await;
            assert_eq!(adapter.in_flight(), 3);
            adapter.disconnect();
        },
    );

    for page in [a, b, c] {
        let page = page.unwrap();
        assert!(page.is_aborted());
        assert!(page.items.is_empty());
    }
    assert_eq!(adapter.in_flight(), 0);
    assert_eq!(adapter.cached_responses(), 0);
    assert_eq!(adapter.cached_urls(), 0);
    assert_eq!(adapter.transport().calls(), 3);
}

#[tokio::test(flavor = "current_thread")]
async fn page_strategy_walks_to_the_end() {
    let adapter = adapter(Strategy::Page, MockTransport::paged(25));
    let q = Query::new();
    let mut position = adapter.first_position();
    let mut seen = Vec::new();
    loop {
        let page = adapter.fetch(&q, &position).await.unwrap();
        seen.extend(ids(&page).into_iter().map(str::to_owned));
        match position.next(&page.meta, page.items.len()) {
            Some(next) => position = next,
            None => break,
        }
    }
    assert_eq!(seen.len(), 25);
    assert_eq!(seen.last().map(String::as_str), Some("item-24"));
    assert_eq!(
        position,
        Position::Page {
            page: 3,
            per_page: 10
        }
    );
}

#[tokio::test(flavor = "current_thread")]
async fn cursor_strategy_follows_server_tokens() {
    let adapter = adapter(Strategy::Cursor, MockTransport::paged(15));
    let q = Query::new();
    let first = adapter.fetch(&q, &adapter.first_position()).await.unwrap();
    assert_eq!(first.meta.cursor.as_deref(), Some("item-9"));
    assert!(first.meta.has_next);
    assert_eq!(adapter.transport().last_param("cursor"), None);

    let next = adapter.first_position().next(&first.meta, 10).unwrap();
    let second = adapter.fetch(&q, &next).await.unwrap();
    assert_eq!(adapter.transport().last_param("cursor").as_deref(), Some("item-9"));
    assert_eq!(ids(&second).first(), Some(&"item-10"));
    assert!(!second.meta.has_next);
}

#[tokio::test(flavor = "current_thread")]
async fn offset_strategy_uses_reported_total() {
    let adapter = adapter(Strategy::Offset, MockTransport::paged(12));
    let q = Query::new().with("status", "open");
    let opts = ReadOptions {
        offset: Some(10),
        ..ReadOptions::default()
    }
    .with_sort("-created");
    let page = adapter.read(&q, &opts).await.unwrap();
    assert_eq!(ids(&page), ["item-10", "item-11"]);
    assert_eq!(page.meta.total, Some(12));
    assert!(!page.meta.has_next);
    let request = &adapter.transport().requests()[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(
        request.url.as_str(),
        "https://api.test/v1/items?status=open&offset=10&limit=10&sort=-created"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn error_bodies_become_transport_errors() {
    let adapter = adapter(Strategy::Page, MockTransport::paged(5));
    let q = Query::new();
    adapter
        .transport()
        .push_response(Response::new(422, r#"{"error":{"message":"bad filter"}}"#));
    adapter.transport().push_response(Response::new(503, "upstream down"));
    adapter.transport().push_network_error("connection reset");

    let first = adapter.read(&q, &ReadOptions::default()).await.unwrap_err();
    assert_eq!(
        first,
        AdapterError::Transport {
            status: 422,
            message: "bad filter".into()
        }
    );
    let second = adapter.read(&q, &ReadOptions::default()).await.unwrap_err();
    assert_eq!(second.to_string(), "transport error: HTTP 503");
    let third = adapter.read(&q, &ReadOptions::default()).await.unwrap_err();
    assert_eq!(third, AdapterError::Network("connection reset".into()));
    assert!(third.is_recoverable());
    assert_eq!(adapter.cached_responses(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn custom_parser_takes_precedence() {
    let transport = MockTransport::fixed(200, r#"{ "items": [{"id": "ignored"}], "rows": [{"id": "r1"}], "more": "t9" }"#);
    let adapter = adapter(Strategy::Cursor, transport).with_parser(|value: &Value| {
        let rows = value["rows"].as_array().cloned().unwrap_or_default();
        let next = match value["more"].as_str() {
            Some(token) => NextHint::Token(token.to_owned()),
            None => NextHint::End,
        };
        Ok(ParsedResponse {
            items: rows,
            meta: ResponseMeta {
                next,
                ..ResponseMeta::default()
            },
        })
    });
    let page = adapter.read(&Query::new(), &ReadOptions::default()).await.unwrap();
    assert_eq!(ids(&page), ["r1"]);
    assert_eq!(page.meta.cursor.as_deref(), Some("t9"));
}

#[tokio::test(flavor = "current_thread")]
async fn writes_are_never_cached() {
    let transport = MockTransport::new(|request| match request.method {
        Method::Delete => Response::new(204, ""),
        _ => Response::new(200, request.body.clone().unwrap_or(Value::Null).to_string()),
    });
    let adapter = adapter(Strategy::Page, transport);
    let record: Record = serde_json::from_value(json!({ "id": 7, "name": "seven" })).unwrap();

    let created = adapter.create(core::slice::from_ref(&record)).await.unwrap();
    assert_eq!(ids(&created), ["7"]);
    let updated = adapter.update(&[record]).await.unwrap();
    assert_eq!(updated.items.len(), 1);
    let deleted = adapter.delete(["7", "8"]).await.unwrap();
    assert!(deleted.items.is_empty());

    let requests = adapter.transport().requests();
    assert_eq!(
        requests.iter().map(|r| r.method).collect::<Vec<_>>(),
        [Method::Post, Method::Put, Method::Delete]
    );
    assert_eq!(requests[0].body, Some(json!([{ "id": "7", "name": "seven" }])));
    assert_eq!(adapter.transport().last_param("ids").as_deref(), Some("7,8"));
    assert_eq!(adapter.cached_responses(), 0);
}
