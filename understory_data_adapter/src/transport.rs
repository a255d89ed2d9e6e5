// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;

/// Request verb.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Cache-eligible read.
    Get,
    /// Create.
    Post,
    /// Update.
    Put,
    /// Delete.
    Delete,
}

impl Method {
    /// Upper-case verb name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A request handed to a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Verb.
    pub method: Method,
    /// Fully-qualified URL including query parameters.
    pub url: Url,
    /// Header pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body for writes.
    pub body: Option<Value>,
}

/// A response produced by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP-style status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch-like primitive the adapter issues requests through.
///
/// Implementations should stop work and return [`TransportError::Aborted`]
/// once `cancel` fires; the adapter also races every call against the token,
/// so a transport that ignores it is still abortable.
#[async_trait(?Send)]
pub trait Transport {
    /// Performs one request.
    async fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, TransportError>;
}

#[async_trait(?Send)]
impl<X: Transport + ?Sized> Transport for Rc<X> {
    async fn send(
        &self,
        request: Request,
        cancel: CancellationToken,
    ) -> Result<Response, TransportError> {
        (**self).send(request, cancel).await
    }
}
