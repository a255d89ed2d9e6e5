// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Error surfaced by adapter operations.
///
/// Cancellation is deliberately absent: aborted requests resolve to
/// [`Page::aborted`](crate::Page::aborted) instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The server answered with a non-success status.
    ///
    /// `message` comes from the response body when it carries one, otherwise
    /// it is `HTTP <status>`.
    #[error("transport error: {message}")]
    Transport {
        /// HTTP-style status code.
        status: u16,
        /// Server-provided or generic message.
        message: String,
    },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The configured base URL or endpoint does not form a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The response body was not JSON, or matched no known envelope.
    #[error("malformed response: {0}")]
    Parse(String),
    /// An item in the response did not deserialize into the item type.
    #[error("failed to decode item: {0}")]
    Decode(String),
    /// A request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl AdapterError {
    /// Returns `true` for failures worth a caller-triggered retry.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Network(_))
    }
}

/// Error returned by a [`Transport`](crate::Transport).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request observed its cancellation token and gave up.
    #[error("request aborted")]
    Aborted,
    /// Connection-level failure.
    #[error("{0}")]
    Network(String),
}
