//! WebSocket session management.
//!
//! A session is driven by a background task that owns the socket. The caller
//! gets a [`WebSocketSession`] handle immediately and observes the session
//! through [`SessionHandlers`] callbacks:
//!
//! - `on_open` fires at most once, when the connection is established.
//! - `on_message` fires for each inbound text message while the session is
//!   open and not yet closing.
//! - `on_closing` fires when a close frame is received from the peer.
//! - `on_closed` fires exactly once on an orderly shutdown.
//! - `on_failure` fires exactly once on an error, after which no further
//!   callbacks are delivered. A failed session never also reports closed.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Message, Utf8Bytes};
use url::Url;

use crate::error::{ApiLinkError, Result};

/// Close code sent when the caller closes without specifying one.
pub const CLOSE_CODE_NORMAL: u16 = 1000;

/// Close reason sent when the caller closes without specifying one.
pub const CLOSE_REASON_NORMAL: &str = "Normal closure";

/// Lifecycle callbacks for a WebSocket session.
///
/// All handlers are optional; unset events are dropped. Handlers run on the
/// session's background task, so they must not block.
///
/// # Examples
///
/// ```rust
/// use apilink::SessionHandlers;
///
/// let handlers = SessionHandlers::new()
///     .on_open(|| println!("connected"))
///     .on_message(|text| println!("got: {text}"))
///     .on_failure(|reason| eprintln!("failed: {reason}"));
/// ```
#[derive(Clone, Default)]
pub struct SessionHandlers {
    on_open: Option<Arc<dyn Fn() + Send + Sync>>,
    on_message: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    on_closing: Option<Arc<dyn Fn(u16, &str) + Send + Sync>>,
    on_closed: Option<Arc<dyn Fn(u16, &str) + Send + Sync>>,
    on_failure: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl SessionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when the connection is established.
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    /// Called for each inbound text message, in arrival order.
    pub fn on_message(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Called when the peer announces it is closing, with the close code and
    /// reason from its close frame.
    pub fn on_closing(mut self, f: impl Fn(u16, &str) + Send + Sync + 'static) -> Self {
        self.on_closing = Some(Arc::new(f));
        self
    }

    /// Called once when the session has shut down in an orderly fashion.
    pub fn on_closed(mut self, f: impl Fn(u16, &str) + Send + Sync + 'static) -> Self {
        self.on_closed = Some(Arc::new(f));
        self
    }

    /// Called once when the session fails. Terminal; no other callbacks
    /// follow.
    pub fn on_failure(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Arc::new(f));
        self
    }

    fn emit_open(&self) {
        if let Some(f) = &self.on_open {
            f();
        }
    }

    fn emit_message(&self, text: &str) {
        if let Some(f) = &self.on_message {
            f(text);
        }
    }

    fn emit_closing(&self, code: u16, reason: &str) {
        if let Some(f) = &self.on_closing {
            f(code, reason);
        }
    }

    fn emit_closed(&self, code: u16, reason: &str) {
        if let Some(f) = &self.on_closed {
            f(code, reason);
        }
    }

    fn emit_failure(&self, reason: &str) {
        if let Some(f) = &self.on_failure {
            f(reason);
        }
    }
}

impl std::fmt::Debug for SessionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_closing", &self.on_closing.is_some())
            .field("on_closed", &self.on_closed.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

enum Command {
    Send(String),
    Close { code: u16, reason: String },
}

/// Handle to a live WebSocket session.
///
/// The handle is available before the connection completes; sends issued
/// before the session opens are rejected by the background task. Dropping
/// the handle does not close the session; the task keeps running until the
/// peer closes or the connection fails.
#[derive(Debug, Clone)]
pub struct WebSocketSession {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl WebSocketSession {
    /// Spawn the session task and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn connect(url: String, handlers: SessionHandlers) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_session(url, handlers, cmd_rx));
        Self { cmd_tx }
    }

    /// Queue a text message for sending.
    ///
    /// Fails only if the session task has already terminated.
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        self.cmd_tx
            .send(Command::Send(text.into()))
            .map_err(|_| ApiLinkError::WebSocket("session is closed".to_string()))
    }

    /// Close the session with the default code and reason
    /// (1000, "Normal closure").
    pub fn close(&self) -> Result<()> {
        self.close_with(CLOSE_CODE_NORMAL, CLOSE_REASON_NORMAL)
    }

    /// Close the session with an explicit code and reason.
    pub fn close_with(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.cmd_tx
            .send(Command::Close {
                code,
                reason: reason.into(),
            })
            .map_err(|_| ApiLinkError::WebSocket("session is closed".to_string()))
    }
}

async fn run_session(
    url: String,
    handlers: SessionHandlers,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    // Validate the URL before anything reaches the network.
    if let Err(e) = Url::parse(&url) {
        debug!("[WS] Rejecting malformed URL {url:?}: {e}");
        handlers.emit_failure(&ApiLinkError::InvalidUrl(url).to_string());
        return;
    }

    debug!("[WS] Connecting to {url}");
    let connect = connect_async(&url);
    tokio::pin!(connect);

    // Commands are accepted while connecting so that a close issued before
    // the handshake completes can abort it.
    let mut cmd_open = true;
    let mut ws = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((ws, _response)) => break ws,
                Err(e) => {
                    debug!("[WS] Connect to {url} failed: {e}");
                    handlers.emit_failure(&e.to_string());
                    return;
                }
            },
            cmd = cmd_rx.recv(), if cmd_open => match cmd {
                Some(Command::Close { code, reason }) => {
                    debug!("[WS] Close requested before {url} opened");
                    handlers.emit_closed(code, &reason);
                    return;
                }
                Some(Command::Send(_)) => {
                    warn!("[WS] Dropping message sent before session opened");
                }
                None => cmd_open = false,
            },
        }
    };

    debug!("[WS] Session open: {url}");
    handlers.emit_open();

    // Set once the peer's close frame arrives, so the final closed event can
    // carry its code and reason.
    let mut close_frame: Option<(u16, String)> = None;
    // True once either side has started the close handshake. Inbound text is
    // no longer delivered past this point.
    let mut closing = false;

    loop {
        tokio::select! {
            inbound = ws.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if closing {
                        debug!("[WS] Discarding text received while closing");
                    } else {
                        handlers.emit_message(text.as_str());
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if ws.send(Message::Pong(data)).await.is_err() {
                        handlers.emit_failure("connection lost while answering ping");
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match &frame {
                        Some(f) => (u16::from(f.code), f.reason.to_string()),
                        None => (CLOSE_CODE_NORMAL, String::new()),
                    };
                    debug!("[WS] Peer closing {url}: code={code} reason={reason:?}");
                    handlers.emit_closing(code, &reason);
                    if !closing {
                        closing = true;
                        // Acknowledge with the peer's own code and reason.
                        let _ = ws.close(frame.clone()).await;
                    }
                    close_frame = Some((code, reason));
                }
                Some(Ok(Message::Pong(_))) => {}
                Some(Ok(other)) => {
                    debug!("[WS] Ignoring non-text frame: {other:?}");
                }
                Some(Err(e)) => {
                    debug!("[WS] Session {url} failed: {e}");
                    handlers.emit_failure(&e.to_string());
                    return;
                }
                None => {
                    let (code, reason) =
                        close_frame.unwrap_or((CLOSE_CODE_NORMAL, String::new()));
                    debug!("[WS] Session closed: {url} code={code}");
                    handlers.emit_closed(code, &reason);
                    return;
                }
            },
            cmd = cmd_rx.recv(), if cmd_open => match cmd {
                Some(Command::Send(text)) => {
                    if closing {
                        debug!("[WS] Dropping outbound message: session is closing");
                        continue;
                    }
                    if let Err(e) = ws.send(Message::text(text)).await {
                        debug!("[WS] Send on {url} failed: {e}");
                        handlers.emit_failure(&e.to_string());
                        return;
                    }
                }
                Some(Command::Close { code, reason }) => {
                    if closing {
                        continue;
                    }
                    closing = true;
                    debug!("[WS] Closing {url}: code={code} reason={reason:?}");
                    close_frame = Some((code, reason.clone()));
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: Utf8Bytes::from(reason),
                    };
                    if let Err(e) = ws.close(Some(frame)).await {
                        debug!("[WS] Close handshake on {url} failed: {e}");
                        handlers.emit_failure(&e.to_string());
                        return;
                    }
                    // Keep reading until the peer acknowledges and the
                    // stream ends.
                }
                None => cmd_open = false,
            },
        }
    }
}
