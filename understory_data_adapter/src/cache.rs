// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::time::Duration;

use hashbrown::HashMap;
use url::Url;
use web_time::Instant;

use crate::error::AdapterError;

/// Source of the current time for cache expiry.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by the platform monotonic clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Read responses keyed by fully-qualified URL, expiring after a fixed TTL.
///
/// Entries hold the raw body so a hit is decoded like a fresh response.
pub(crate) struct ResponseCache {
    ttl: Duration,
    entries: HashMap<String, (Instant, String)>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ResponseCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The cached body for `url`, evicting it if it has expired.
    pub(crate) fn get(&mut self, url: &str, now: Instant) -> Option<&str> {
        let fresh = match self.entries.get(url) {
            Some((stored, _)) => now.saturating_duration_since(*stored) < self.ttl,
            None => return None,
        };
        if !fresh {
            self.entries.remove(url);
            return None;
        }
        self.entries.get(url).map(|(_, body)| body.as_str())
    }

    pub(crate) fn insert(&mut self, url: String, body: String, now: Instant) {
        self.entries.insert(url, (now, body));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Memoized endpoint URLs per base/endpoint pair.
#[derive(Debug, Default)]
pub(crate) struct UrlCache {
    entries: HashMap<(String, String), Url>,
}

impl UrlCache {
    /// The endpoint URL for `base` and `endpoint`, without query parameters.
    ///
    /// `base` is treated as a directory and `endpoint` as relative to it, so
    /// `https://host/v1` + `/users` resolves to `https://host/v1/users`.
    pub(crate) fn resolve(&mut self, base: &str, endpoint: &str) -> Result<Url, AdapterError> {
        let key = (base.to_owned(), endpoint.to_owned());
        if let Some(url) = self.entries.get(&key) {
            return Ok(url.clone());
        }
        let mut root = base.to_owned();
        if !root.ends_with('/') {
            root.push('/');
        }
        let url = Url::parse(&root)
            .and_then(|root| root.join(endpoint.trim_start_matches('/')))
            .map_err(|err| AdapterError::InvalidUrl(format!("{base} + {endpoint}: {err}")))?;
        self.entries.insert(key, url.clone());
        Ok(url)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
