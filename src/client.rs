//! Client facade: one configured transport behind a small call surface.
//!
//! An [`ApiLinkClient`] wraps a single connection-pooled HTTP client. It is
//! cheap to clone and safe to share across tasks; every call goes through the
//! same pool and the same timeout configuration.
//!
//! # Examples
//!
//! ```rust,no_run
//! use apilink::{ApiLinkClient, Endpoint};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn demo() -> apilink::Result<()> {
//! let client = ApiLinkClient::new()?;
//! let item: Item = client
//!     .get(Endpoint::new("https://api.example.com/items").query("id", "42"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dispatch::{self, Completion};
use crate::endpoint::Endpoint;
use crate::error::{ApiLinkError, Result};
use crate::request::{Body, Method, Request};
use crate::timeouts::ApiLinkTimeouts;
use crate::websocket::{SessionHandlers, WebSocketSession};

/// Asynchronous API client over a shared connection pool.
#[derive(Debug, Clone)]
pub struct ApiLinkClient {
    http: reqwest::Client,
}

impl ApiLinkClient {
    /// Create a client with default timeouts.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start building a client with custom configuration.
    pub fn builder() -> ApiLinkClientBuilder {
        ApiLinkClientBuilder::default()
    }

    /// Dispatch a GET request and decode the JSON response into `T`.
    pub fn get<T>(&self, endpoint: impl Into<Endpoint>) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send(Request::new(Method::Get, endpoint))
    }

    /// Dispatch a POST request with a JSON payload.
    ///
    /// The payload is serialized at call time; a payload that cannot be
    /// serialized resolves the completion with a serialization failure
    /// without touching the transport.
    pub fn post<T, B>(&self, endpoint: impl Into<Endpoint>, payload: &B) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        match Body::json(payload) {
            Ok(body) => self.send(Request::with_body(Method::Post, endpoint, body)),
            Err(e) => dispatch::completed(Err(e)),
        }
    }

    /// Dispatch a PUT request with a JSON payload.
    pub fn put<T, B>(&self, endpoint: impl Into<Endpoint>, payload: &B) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        match Body::json(payload) {
            Ok(body) => self.send(Request::with_body(Method::Put, endpoint, body)),
            Err(e) => dispatch::completed(Err(e)),
        }
    }

    /// Dispatch a DELETE request and decode the JSON response into `T`.
    pub fn delete<T>(&self, endpoint: impl Into<Endpoint>) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send(Request::new(Method::Delete, endpoint))
    }

    /// Dispatch a POST request carrying an arbitrary [`Body`], e.g. a file
    /// upload, a multipart form, or a gzip-wrapped payload.
    pub fn upload<T>(&self, endpoint: impl Into<Endpoint>, body: Body) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send(Request::with_body(Method::Post, endpoint, body))
    }

    /// Dispatch a prepared [`Request`].
    ///
    /// Returns immediately; the request runs on a background task and the
    /// completion resolves with exactly one terminal result.
    pub fn send<T>(&self, request: Request) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        dispatch::dispatch(self.http.clone(), request)
    }

    /// Open a WebSocket session against `url`, reporting lifecycle events
    /// through `handlers`.
    ///
    /// The returned session handle is available immediately; connection
    /// progress and failures are delivered through the handlers.
    pub fn connect_websocket(
        &self,
        url: impl Into<String>,
        handlers: SessionHandlers,
    ) -> WebSocketSession {
        WebSocketSession::connect(url.into(), handlers)
    }
}

/// Builder for [`ApiLinkClient`].
#[derive(Debug, Default)]
pub struct ApiLinkClientBuilder {
    timeouts: ApiLinkTimeouts,
}

impl ApiLinkClientBuilder {
    /// Use the given timeout configuration.
    pub fn timeouts(mut self, timeouts: ApiLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the client and its underlying connection pool.
    pub fn build(self) -> Result<ApiLinkClient> {
        let t = &self.timeouts;
        debug!(
            "[CLIENT] Building client: connect={:?} receive={:?} send={:?}",
            t.connection_timeout, t.receive_timeout, t.send_timeout
        );
        // The transport has no per-write timeout knob, so the send timeout is
        // folded into an overall deadline for the whole call.
        let http = reqwest::Client::builder()
            .connect_timeout(t.connection_timeout)
            .read_timeout(t.receive_timeout)
            .timeout(t.connection_timeout + t.send_timeout + t.receive_timeout)
            .build()
            .map_err(|e| ApiLinkError::Configuration(e.to_string()))?;
        Ok(ApiLinkClient { http })
    }
}
