//! WebSocket connection object.
//!
//! The client-side handle that owns a [`PendingMessageRelay`] for its
//! `OnMessage` channel, plus unbuffered `OnOpen` and `OnClose` signals.
//!
//! # Architecture: Action-Based State Machine
//!
//! No I/O happens here. Transport events are fed in through the
//! `transport_*` methods, and operations that need the network return
//! [`SocketAction`]s for a driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌────────────┐  transport_opened  ┌──────┐
//! │ Connecting │───────────────────>│ Open │
//! └────────────┘                    └──────┘
//!       │ close()                      │ close()
//!       ↓                              ↓
//!  ┌─────────┐   transport_closed   ┌────────┐
//!  │ Closing │─────────────────────>│ Closed │
//!  └─────────┘                      └────────┘
//! ```
//!
//! `transport_closed` moves any state to `Closed`.
//!
//! # Message buffering
//!
//! Messages that arrive before application code subscribes to `OnMessage`
//! are buffered by the relay and replayed to the first subscriber. Open and
//! close signals are not buffered: a handler registered after the event
//! never sees it.

use tracing::debug;

use crate::{
    error::{RelayError, SocketError},
    handler::{Handler, HandlerError},
    payload::Payload,
    relay::PendingMessageRelay,
};

/// Actions returned by the socket for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketAction {
    /// Open a transport connection to this URL
    Open {
        /// Validated WebSocket URL
        url: String,
    },
    /// Send this payload to the peer
    Send(Payload),
    /// Close the transport connection
    Close,
}

/// Socket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Transport connection requested, not yet open
    Connecting,
    /// Transport connection open
    Open,
    /// Close requested, waiting for the transport to confirm
    Closing,
    /// Transport connection closed
    Closed,
}

/// Socket configuration
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Accept plain `ws://` URLs in addition to `wss://`
    pub allow_insecure: bool,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self { allow_insecure: true }
    }
}

/// A validated `ws://` or `wss://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketUrl(String);

impl SocketUrl {
    /// Validate `url` against the socket configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::InvalidUrl`] if the URL is empty, contains
    /// whitespace, uses another scheme, or has no host after the scheme.
    pub fn parse(url: &str, config: &SocketConfig) -> Result<Self, SocketError> {
        let invalid = |reason: &'static str| SocketError::InvalidUrl { url: url.to_string(), reason };

        if url.is_empty() {
            return Err(invalid("empty"));
        }
        if url.contains([' ', '\t', '\r', '\n']) {
            return Err(invalid("contains whitespace"));
        }

        let rest = if let Some(rest) = url.strip_prefix("wss://") {
            rest
        } else if let Some(rest) = url.strip_prefix("ws://") {
            if !config.allow_insecure {
                return Err(invalid("insecure scheme not allowed"));
            }
            rest
        } else {
            return Err(invalid("scheme must be ws:// or wss://"));
        };

        match rest.as_bytes().first() {
            None | Some(b'/') => Err(invalid("missing host")),
            Some(_) => Ok(Self(url.to_string())),
        }
    }

    /// The URL as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

type SignalHandler = Box<dyn FnMut() -> Result<(), HandlerError> + Send>;

/// Unbuffered event channel.
struct Signal {
    name: &'static str,
    handlers: Vec<SignalHandler>,
}

impl Signal {
    fn new(name: &'static str) -> Self {
        Self { name, handlers: Vec::new() }
    }

    fn fire(&mut self) -> Result<(), SocketError> {
        for (index, handler) in self.handlers.iter_mut().enumerate() {
            handler().map_err(|source| SocketError::Signal {
                signal: self.name,
                handler: index,
                source,
            })?;
        }
        Ok(())
    }
}

/// Client WebSocket handle.
///
/// Owns the message relay and the lifecycle signals for one connection.
pub struct WebSocket {
    url: SocketUrl,
    state: SocketState,
    messages: PendingMessageRelay,
    on_open: Signal,
    on_close: Signal,
}

impl WebSocket {
    /// Validate `url` and create a socket in the `Connecting` state.
    ///
    /// Returns the socket and the action that asks the driver to open the
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `url` fails validation under `config`.
    pub fn connect(
        url: &str,
        config: &SocketConfig,
    ) -> Result<(Self, Vec<SocketAction>), SocketError> {
        let url = SocketUrl::parse(url, config)?;
        debug!(url = url.as_str(), "connecting");

        let actions = vec![SocketAction::Open { url: url.as_str().to_string() }];
        let socket = Self {
            url,
            state: SocketState::Connecting,
            messages: PendingMessageRelay::new(),
            on_open: Signal::new("OnOpen"),
            on_close: Signal::new("OnClose"),
        };

        Ok((socket, actions))
    }

    /// Current state
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// The URL this socket connects to
    pub fn url(&self) -> &SocketUrl {
        &self.url
    }

    /// The relay behind the `OnMessage` channel
    pub fn relay(&self) -> &PendingMessageRelay {
        &self.messages
    }

    /// Subscribe to `OnMessage`.
    ///
    /// The first subscriber receives every message buffered so far before
    /// this call returns.
    pub fn on_message<H>(&mut self, handler: H) -> Result<(), RelayError>
    where
        H: Handler + 'static,
    {
        self.messages.attach(handler)
    }

    /// Subscribe to `OnOpen`.
    pub fn on_open<F>(&mut self, handler: F)
    where
        F: FnMut() -> Result<(), HandlerError> + Send + 'static,
    {
        self.on_open.handlers.push(Box::new(handler));
    }

    /// Subscribe to `OnClose`.
    pub fn on_close<F>(&mut self, handler: F)
    where
        F: FnMut() -> Result<(), HandlerError> + Send + 'static,
    {
        self.on_close.handlers.push(Box::new(handler));
    }

    /// The transport finished opening.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless connecting, or `Signal` if an `OnOpen`
    /// handler fails.
    pub fn transport_opened(&mut self) -> Result<(), SocketError> {
        if self.state != SocketState::Connecting {
            return Err(self.invalid_state("open"));
        }

        self.state = SocketState::Open;
        debug!(url = self.url.as_str(), "open");
        self.on_open.fire()
    }

    /// The transport received a message.
    ///
    /// Accepted in every state except `Closed`.
    pub fn transport_message(&mut self, data: impl AsRef<[u8]>) -> Result<(), SocketError> {
        if self.state == SocketState::Closed {
            return Err(self.invalid_state("receive"));
        }

        self.messages.deliver(data)?;
        Ok(())
    }

    /// The transport closed. Repeated calls are no-ops.
    pub fn transport_closed(&mut self) -> Result<(), SocketError> {
        if self.state == SocketState::Closed {
            return Ok(());
        }

        self.state = SocketState::Closed;
        debug!(url = self.url.as_str(), "closed");
        self.on_close.fire()
    }

    /// Send a message to the peer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the socket is open.
    pub fn send(&mut self, data: impl AsRef<[u8]>) -> Result<Vec<SocketAction>, SocketError> {
        if self.state != SocketState::Open {
            return Err(self.invalid_state("send"));
        }

        Ok(vec![SocketAction::Send(Payload::copy_from_slice(data.as_ref()))])
    }

    /// Request the transport to close.
    ///
    /// Returns no actions if already closing or closed.
    pub fn close(&mut self) -> Vec<SocketAction> {
        match self.state {
            SocketState::Connecting | SocketState::Open => {
                self.state = SocketState::Closing;
                debug!(url = self.url.as_str(), "closing");
                vec![SocketAction::Close]
            },
            SocketState::Closing | SocketState::Closed => Vec::new(),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SocketError {
        SocketError::InvalidState { state: self.state, operation }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn open_socket() -> WebSocket {
        let (mut socket, _) = WebSocket::connect("wss://example.com/feed", &SocketConfig::default())
            .expect("valid url");
        socket.transport_opened().unwrap();
        socket
    }

    #[test]
    fn url_validation() {
        let config = SocketConfig::default();

        assert!(SocketUrl::parse("ws://localhost:8080", &config).is_ok());
        assert!(SocketUrl::parse("wss://example.com/path?q=1", &config).is_ok());

        for bad in ["", "http://example.com", "ws://", "wss:///path", "ws://a b", "wss://x\n"] {
            let result = SocketUrl::parse(bad, &config);
            assert!(
                matches!(result, Err(SocketError::InvalidUrl { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn insecure_scheme_can_be_disabled() {
        let config = SocketConfig { allow_insecure: false };
        assert!(SocketUrl::parse("ws://localhost", &config).is_err());
        assert!(SocketUrl::parse("wss://localhost", &config).is_ok());
    }

    #[test]
    fn connect_returns_open_action() {
        let (socket, actions) =
            WebSocket::connect("ws://localhost:9000", &SocketConfig::default()).unwrap();

        assert_eq!(socket.state(), SocketState::Connecting);
        assert_eq!(socket.url().as_str(), "ws://localhost:9000");
        assert_eq!(actions, vec![SocketAction::Open { url: "ws://localhost:9000".into() }]);
    }

    #[test]
    fn messages_before_subscription_are_replayed() {
        let (mut socket, _) =
            WebSocket::connect("ws://localhost", &SocketConfig::default()).unwrap();
        socket.transport_message(b"early").unwrap();
        socket.transport_opened().unwrap();
        socket.transport_message(b"\x00binary").unwrap();
        assert_eq!(socket.relay().pending_len(), 2);

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        socket
            .on_message(move |payload: Payload| -> Result<(), HandlerError> {
                sink.lock().unwrap().push(payload);
                Ok(())
            })
            .unwrap();
        socket.transport_message(b"late").unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![Payload::from(b"early"), Payload::from(b"\x00binary"), Payload::from(b"late")]
        );
        assert_eq!(socket.relay().pending_len(), 0);
    }

    #[test]
    fn open_signal_is_not_buffered() {
        let (mut socket, _) =
            WebSocket::connect("ws://localhost", &SocketConfig::default()).unwrap();
        let early = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&early);
        socket.on_open(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        socket.transport_opened().unwrap();

        let late = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&late);
        socket.on_open(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(early.load(Ordering::SeqCst), 1);
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn send_requires_open() {
        let (mut socket, _) =
            WebSocket::connect("ws://localhost", &SocketConfig::default()).unwrap();
        assert!(matches!(
            socket.send(b"hi"),
            Err(SocketError::InvalidState { state: SocketState::Connecting, .. })
        ));

        socket.transport_opened().unwrap();
        let actions = socket.send(b"hi\x00").unwrap();
        assert_eq!(actions, vec![SocketAction::Send(Payload::from(b"hi\x00"))]);
    }

    #[test]
    fn close_lifecycle() {
        let mut socket = open_socket();
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closed);
        socket.on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(socket.close(), vec![SocketAction::Close]);
        assert_eq!(socket.state(), SocketState::Closing);
        assert!(socket.close().is_empty());

        // Messages in flight while closing still reach the relay
        socket.transport_message(b"last words").unwrap();
        assert_eq!(socket.relay().pending_len(), 1);

        socket.transport_closed().unwrap();
        socket.transport_closed().unwrap();
        assert_eq!(socket.state(), SocketState::Closed);
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        assert!(matches!(
            socket.transport_message(b"ghost"),
            Err(SocketError::InvalidState { state: SocketState::Closed, .. })
        ));
        assert!(socket.send(b"x").is_err());
    }

    #[test]
    fn opening_twice_is_rejected() {
        let mut socket = open_socket();
        assert!(matches!(socket.transport_opened(), Err(SocketError::InvalidState { .. })));
    }

    #[test]
    fn failing_signal_handler_stops_fan_out() {
        let (mut socket, _) =
            WebSocket::connect("ws://localhost", &SocketConfig::default()).unwrap();
        let after = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&after);
        socket.on_open(|| Err(HandlerError::new("refused")));
        socket.on_open(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = socket.transport_opened().unwrap_err();
        assert!(matches!(err, SocketError::Signal { signal: "OnOpen", handler: 0, .. }));
        assert_eq!(after.load(Ordering::SeqCst), 0);
        assert_eq!(socket.state(), SocketState::Open);
    }

    #[test]
    fn message_handler_error_surfaces_as_relay_error() {
        let mut socket = open_socket();
        socket
            .on_message(|_: Payload| -> Result<(), HandlerError> { Err(HandlerError::new("nope")) })
            .unwrap();

        let err = socket.transport_message(b"x").unwrap_err();
        assert!(matches!(err, SocketError::Relay(RelayError::Dispatch { handler: 0, .. })));
    }
}
