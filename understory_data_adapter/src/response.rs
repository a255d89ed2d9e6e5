// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Response normalization.
//!
//! Servers wrap item lists in a handful of envelope shapes and spell their
//! pagination fields in many ways. This module decides the shape once per
//! response and extracts the hints [`PageMeta`](crate::PageMeta) is built from.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::AdapterError;

const NEXT_FIELDS: &[&str] = &[
    "nextCursor",
    "next_cursor",
    "cursor",
    "next",
    "nextPageToken",
    "next_page_token",
    "after",
];
const TOTAL_FIELDS: &[&str] = &[
    "total",
    "totalCount",
    "total_count",
    "count",
    "totalElements",
    "total_elements",
];
const PAGES_FIELDS: &[&str] = &["pages", "totalPages", "total_pages", "pageCount", "page_count"];
const HAS_NEXT_FIELDS: &[&str] = &["hasNext", "has_next", "hasMore", "has_more", "more"];
const META_OBJECTS: &[&str] = &["meta", "pagination", "page"];

/// The server's next-range hint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NextHint {
    /// No next-cursor field was present.
    #[default]
    Absent,
    /// The field was present and `null`: there is no next range.
    End,
    /// A continuation token.
    Token(String),
}

/// Pagination hints found in a response, before strategy rules apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// Next-cursor hint.
    pub next: NextHint,
    /// Reported total item count.
    pub total: Option<u64>,
    /// Reported total page count.
    pub pages: Option<u32>,
    /// Reported has-next flag.
    pub has_next: Option<bool>,
}

/// Items and hints extracted from a response body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedResponse {
    /// Raw items, decoded into the item type by the adapter.
    pub items: Vec<Value>,
    /// Pagination hints.
    pub meta: ResponseMeta,
}

/// Caller-supplied parser that replaces built-in envelope detection.
pub type ResponseParser = Rc<dyn Fn(&Value) -> Result<ParsedResponse, AdapterError>>;

/// Recognized response envelope shapes.
///
/// Each map variant holds the envelope with its item array removed.
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    /// A bare JSON array of items.
    Bare(Vec<Value>),
    /// `{ "items": [...], ... }`
    Items(Vec<Value>, Map<String, Value>),
    /// `{ "data": [...], ... }`
    Data(Vec<Value>, Map<String, Value>),
    /// `{ "results": [...], ... }`
    Results(Vec<Value>, Map<String, Value>),
    /// `{ "content": [...], ... }`
    Content(Vec<Value>, Map<String, Value>),
}

impl Envelope {
    /// Classifies a response body.
    ///
    /// Object envelopes are tried in the order `items`, `data`, `results`,
    /// `content`; the first key holding an array wins.
    pub fn detect(body: Value) -> Result<Self, AdapterError> {
        let mut map = match body {
            Value::Array(items) => return Ok(Self::Bare(items)),
            Value::Object(map) => map,
            other => {
                return Err(AdapterError::Parse(format!(
                    "expected an array or object, found {}",
                    kind_of(&other)
                )));
            }
        };
        let key = ["items", "data", "results", "content"]
            .into_iter()
            .find(|key| map.get(*key).is_some_and(Value::is_array))
            .ok_or_else(|| AdapterError::Parse("no item array in response".to_owned()))?;
        let Some(Value::Array(items)) = map.remove(key) else {
            return Err(AdapterError::Parse("no item array in response".to_owned()));
        };
        Ok(match key {
            "items" => Self::Items(items, map),
            "data" => Self::Data(items, map),
            "results" => Self::Results(items, map),
            _ => Self::Content(items, map),
        })
    }

    /// Splits the envelope into its items and pagination hints.
    #[must_use]
    pub fn into_parts(self) -> ParsedResponse {
        match self {
            Self::Bare(items) => ParsedResponse {
                items,
                meta: ResponseMeta::default(),
            },
            Self::Items(items, rest)
            | Self::Data(items, rest)
            | Self::Results(items, rest)
            | Self::Content(items, rest) => ParsedResponse {
                items,
                meta: read_meta(&rest),
            },
        }
    }
}

/// Parses a success body with `parser` if given, else by envelope detection.
pub(crate) fn parse_body(
    body: &str,
    parser: Option<&ResponseParser>,
) -> Result<ParsedResponse, AdapterError> {
    let value: Value = if body.trim().is_empty() {
        Value::Array(Vec::new())
    } else {
        serde_json::from_str(body).map_err(|err| AdapterError::Parse(err.to_string()))?
    };
    match parser {
        Some(parser) => parser(&value),
        None => Envelope::detect(value).map(Envelope::into_parts),
    }
}

/// Message carried by an error body, if it has a recognized shape.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let map = value.as_object()?;
    match map.get("error") {
        Some(Value::String(message)) => return Some(message.clone()),
        Some(Value::Object(inner)) => {
            if let Some(Value::String(message)) = inner.get("message") {
                return Some(message.clone());
            }
        }
        _ => {}
    }
    map.get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Nested metadata objects first, then the envelope's own fields.
fn read_meta(envelope: &Map<String, Value>) -> ResponseMeta {
    let mut sources: Vec<&Map<String, Value>> = META_OBJECTS
        .iter()
        .filter_map(|key| envelope.get(*key).and_then(Value::as_object))
        .collect();
    sources.push(envelope);

    let find = |fields: &[&str]| {
        sources
            .iter()
            .find_map(|source| fields.iter().find_map(|field| source.get(*field)))
    };

    let next = match find(NEXT_FIELDS) {
        None => NextHint::Absent,
        Some(Value::Null) => NextHint::End,
        Some(Value::String(token)) if token.is_empty() => NextHint::End,
        Some(Value::String(token)) => NextHint::Token(token.clone()),
        Some(Value::Number(n)) => NextHint::Token(n.to_string()),
        Some(_) => NextHint::Absent,
    };
    ResponseMeta {
        next,
        total: find(TOTAL_FIELDS).and_then(as_count),
        pages: find(PAGES_FIELDS)
            .and_then(as_count)
            .map(|pages| u32::try_from(pages).unwrap_or(u32::MAX)),
        has_next: find(HAS_NEXT_FIELDS).and_then(Value::as_bool),
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Envelope, NextHint, error_message, parse_body};

    #[test]
    fn detects_every_envelope() {
        for key in ["items", "data", "results", "content"] {
            let body = json!({ key: [{ "id": "a" }], "meta": { "total": 1 } });
            let parsed = Envelope::detect(body).unwrap().into_parts();
            assert_eq!(parsed.items.len(), 1, "envelope {key}");
            assert_eq!(parsed.meta.total, Some(1), "envelope {key}");
        }
        let bare = Envelope::detect(json!([{ "id": "a" }, { "id": "b" }])).unwrap();
        assert!(matches!(bare, Envelope::Bare(ref items) if items.len() == 2));
    }

    #[test]
    fn nested_meta_wins_over_top_level() {
        let body = json!({
            "data": [],
            "total": 99,
            "pagination": { "totalCount": 10, "next_page_token": "t2" },
        });
        let meta = Envelope::detect(body).unwrap().into_parts().meta;
        assert_eq!(meta.total, Some(10));
        assert_eq!(meta.next, NextHint::Token("t2".into()));
    }

    #[test]
    fn numeric_page_is_not_metadata() {
        let body = json!({ "content": [], "page": 3, "totalPages": 7, "hasMore": true });
        let meta = Envelope::detect(body).unwrap().into_parts().meta;
        assert_eq!(meta.pages, Some(7));
        assert_eq!(meta.has_next, Some(true));

        let nested = json!({ "content": [], "page": { "totalElements": 70 } });
        assert_eq!(Envelope::detect(nested).unwrap().into_parts().meta.total, Some(70));
    }

    #[test]
    fn null_cursor_is_an_explicit_end() {
        let body = json!({ "results": [], "meta": { "nextCursor": null } });
        assert_eq!(Envelope::detect(body).unwrap().into_parts().meta.next, NextHint::End);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(Envelope::detect(json!({ "rows": [] })).is_err());
        assert!(Envelope::detect(json!("nope")).is_err());
        assert!(parse_body("<html>", None).is_err());
    }

    #[test]
    fn error_bodies() {
        assert_eq!(error_message(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message(r#"{"message":"bad"}"#).as_deref(), Some("bad"));
        assert_eq!(
            error_message(r#"{"error":{"message":"deep"}}"#).as_deref(),
            Some("deep")
        );
        assert_eq!(error_message("Internal Server Error"), None);
        assert_eq!(error_message(r#"{"error":{"code":5}}"#), None);
    }
}
