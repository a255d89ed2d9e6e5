// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use understory_collection::Keyed;

/// A schemaless item: a JSON object with an `id` field.
///
/// Numeric ids are normalized to strings on construction, so `{"id": 7}` and
/// `{"id": "7"}` name the same item. Objects without a usable id produce an
/// empty [`Keyed::id`] and are rejected by collections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record(Map<String, Value>);

impl Record {
    /// Returns the field `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(mut map: Map<String, Value>) -> Self {
        if let Some(Value::Number(n)) = map.get("id") {
            let id = n.to_string();
            map.insert("id".to_owned(), Value::String(id));
        }
        Self(map)
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.0
    }
}

impl Keyed for Record {
    fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or("")
    }
}
