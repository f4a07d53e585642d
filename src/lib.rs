//! apilink: asynchronous HTTP and WebSocket client helpers.
//!
//! A thin, callback-free layer over a pooled HTTP transport:
//!
//! - [`ApiLinkClient`]: shared client with GET/POST/PUT/DELETE helpers that
//!   decode JSON responses into caller-declared types.
//! - [`Completion`]: exactly-once asynchronous result of a dispatched
//!   request.
//! - [`Body`]: request payloads, including streaming file uploads, multipart
//!   forms, and a gzip wrapper that compresses without buffering.
//! - [`WebSocketSession`] and [`SessionHandlers`]: event-driven WebSocket
//!   sessions with an orderly close handshake.
//!
//! # Examples
//!
//! ```rust,no_run
//! use apilink::{ApiLinkClient, Endpoint};
//!
//! # async fn demo() -> apilink::Result<()> {
//! let client = ApiLinkClient::new()?;
//! let item: serde_json::Value = client
//!     .get(Endpoint::new("https://api.example.com/items").query("id", "42"))
//!     .await?;
//! println!("{item}");
//! # Ok(())
//! # }
//! ```

mod client;
mod compression;
mod dispatch;
mod endpoint;
mod error;
mod request;
mod response;
mod timeouts;
mod websocket;

pub use client::{ApiLinkClient, ApiLinkClientBuilder};
pub use compression::{decompress_gzip, gzip_stream, is_gzip};
pub use dispatch::Completion;
pub use endpoint::Endpoint;
pub use error::{ApiLinkError, Result};
pub use request::{Body, FormField, FormValue, Method, Request};
pub use response::decode_response;
pub use timeouts::ApiLinkTimeouts;
pub use websocket::{
    SessionHandlers, WebSocketSession, CLOSE_CODE_NORMAL, CLOSE_REASON_NORMAL,
};

/// Library version, from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
