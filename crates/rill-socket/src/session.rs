//! The connection session: one persistent transport, one receive loop.
//!
//! A [`Session`] owns the connect/reconnect lifecycle around a WebSocket
//! transport. Inbound frames are handed to the [`Dispatcher`] on a dedicated
//! receive-loop task; outbound sends go through a shared sink and return
//! once the transport accepts the write (peer acknowledgement, if any,
//! arrives later as an ordinary inbound packet).
//!
//! Two things re-enter the connect path without the owner asking: a peer
//! reconnect signal, and a missed keep-alive reply. Both cancel the current
//! transport tasks promptly and re-dial the last-used address. The
//! subscriber registry lives outside the transport, so registrations
//! survive reconnects.

use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{Duration, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use rill_settings::SocketSettings;

use crate::dispatch::Dispatcher;
use crate::errors::SessionError;
use crate::protocol::WireProtocol;
use crate::registry::SubscriberRegistry;
use crate::state::{SessionEvent, SessionState, transition};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
type SharedSink = Arc<tokio::sync::Mutex<WsSink>>;

struct Inner {
    state: SessionState,
    url: Option<String>,
    sink: Option<SharedSink>,
    cancel: Option<CancellationToken>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            url: None,
            sink: None,
            cancel: None,
        }
    }
}

/// One persistent connection to a realtime endpoint.
pub struct Session {
    protocol: Arc<dyn WireProtocol>,
    dispatcher: Arc<Dispatcher>,
    settings: SocketSettings,
    inner: Mutex<Inner>,
}

impl Session {
    /// Build a session speaking `protocol`, with a fresh registry.
    #[must_use]
    pub fn new(protocol: Arc<dyn WireProtocol>, settings: SocketSettings) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&protocol), registry));
        Self {
            protocol,
            dispatcher,
            settings,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The registry subscribers register with. Shared across reconnects.
    #[must_use]
    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(self.dispatcher.registry())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Establish the transport and start the receive loop.
    ///
    /// Fails with a transport error if the handshake fails, leaving the
    /// session in `Disconnected` — calling again is safe. The initial
    /// connect is never retried internally; that is the caller's call.
    pub async fn connect(self: &Arc<Self>, url: &str) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Disconnected {
                return Err(SessionError::AlreadyActive);
            }
            let Some(next) = transition(inner.state, SessionEvent::ConnectRequested) else {
                return Err(SessionError::AlreadyActive);
            };
            inner.state = next;
            inner.url = Some(url.to_string());
        }

        match self.dial(url).await {
            Ok(parts) => {
                let _ = self.install(parts);
                Ok(())
            }
            Err(err) => {
                let _ = self.apply(SessionEvent::HandshakeFailed);
                Err(err)
            }
        }
    }

    /// Transmit one frame. Returns once the transport accepts the write.
    pub async fn send(&self, frame: &str) -> Result<(), SessionError> {
        let sink = {
            let inner = self.inner.lock();
            if inner.state != SessionState::Connected {
                return Err(SessionError::NotConnected);
            }
            inner.sink.clone().ok_or(SessionError::NotConnected)?
        };
        let mut sink = sink.lock().await;
        sink.send(Message::text(frame)).await?;
        Ok(())
    }

    /// Close the session. Idempotent; pending reads and heartbeats are
    /// cancelled promptly and the session lands in terminal `Disconnected`.
    pub fn close(&self) {
        let (cancel, sink) = {
            let mut inner = self.inner.lock();
            inner.state = SessionState::Disconnected;
            (inner.cancel.take(), inner.sink.take())
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(sink) = sink {
            let _ = tokio::spawn(async move {
                let _ = sink.lock().await.close().await;
            });
        }
        debug!("session closed");
    }

    /// Apply `event` to the state machine; `None` means it was not
    /// meaningful in the current state (e.g. the session raced a close).
    fn apply(&self, event: SessionEvent) -> Option<SessionState> {
        let mut inner = self.inner.lock();
        let next = transition(inner.state, event)?;
        inner.state = next;
        Some(next)
    }

    /// Establish the transport and spawn its reader and heartbeat tasks.
    async fn dial(
        self: &Arc<Self>,
        url: &str,
    ) -> Result<(SharedSink, CancellationToken), SessionError> {
        let connect_timeout = Duration::from_millis(self.settings.connect_timeout_ms);
        let (ws, _response) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| SessionError::ConnectTimeout {
                timeout_ms: self.settings.connect_timeout_ms,
            })??;
        info!(url, protocol = self.protocol.name(), "connected");

        let (sink, stream) = ws.split();
        let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(sink));
        let cancel = CancellationToken::new();
        let (alive_tx, alive_rx) = watch::channel(0_u64);

        let reader = Arc::clone(self);
        let _ = tokio::spawn(reader.run_reader(
            stream,
            Arc::clone(&sink),
            cancel.clone(),
            alive_tx,
        ));
        if self.protocol.keepalive().is_some() {
            let heart = Arc::clone(self);
            let _ = tokio::spawn(heart.run_heartbeat(Arc::clone(&sink), cancel.clone(), alive_rx));
        }
        Ok((sink, cancel))
    }

    /// Adopt a freshly dialed transport, unless a close won the race.
    fn install(&self, (sink, cancel): (SharedSink, CancellationToken)) -> bool {
        let mut inner = self.inner.lock();
        let Some(next) = transition(inner.state, SessionEvent::HandshakeSucceeded) else {
            // closed while dialing; discard the fresh transport
            cancel.cancel();
            return false;
        };
        inner.state = next;
        inner.sink = Some(sink);
        inner.cancel = Some(cancel);
        true
    }

    /// The receive loop. Runs until cancelled, the transport drops, or the
    /// peer asks for a reconnect.
    async fn run_reader(
        self: Arc<Self>,
        mut stream: WsStream,
        sink: SharedSink,
        cancel: CancellationToken,
        alive: watch::Sender<u64>,
    ) {
        loop {
            let message = tokio::select! {
                () = cancel.cancelled() => return,
                message = stream.next() => message,
            };
            match message {
                Some(Ok(Message::Text(text))) => {
                    let outcome = self.dispatcher.dispatch(text.as_str());
                    if outcome.keepalive_reply {
                        alive.send_modify(|beats| *beats += 1);
                    }
                    if let Some(reply) = outcome.reply {
                        let mut guard = sink.lock().await;
                        if let Err(err) = guard.send(Message::text(reply)).await {
                            warn!(%err, "failed to send protocol reply");
                        }
                    }
                    if outcome.reconnect_requested {
                        info!("peer requested reconnect");
                        self.begin_reconnect(SessionEvent::PeerReconnectRequested);
                        return;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let mut guard = sink.lock().await;
                    let _ = guard.send(Message::Pong(payload)).await;
                }
                Some(Err(err)) => {
                    warn!(%err, "transport error on receive");
                    self.begin_reconnect(SessionEvent::TransportClosed);
                    return;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("transport closed by peer");
                    self.begin_reconnect(SessionEvent::TransportClosed);
                    return;
                }
                Some(Ok(_)) => {}
            }
        }
    }

    /// Client-side keep-alive: send on the interval, require a reply within
    /// the liveness window, reconnect when it does not arrive.
    async fn run_heartbeat(
        self: Arc<Self>,
        sink: SharedSink,
        cancel: CancellationToken,
        alive: watch::Receiver<u64>,
    ) {
        let interval = Duration::from_millis(self.settings.heartbeat_interval_ms);
        let reply_window = Duration::from_millis(self.settings.heartbeat_timeout_ms);
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                () = sleep(interval) => {}
            }
            let Some(frame) = self.protocol.keepalive() else {
                return;
            };
            let beats_before = *alive.borrow();
            {
                let mut guard = sink.lock().await;
                if let Err(err) = guard.send(Message::text(frame)).await {
                    // the reader observes the dead transport and reconnects
                    warn!(%err, "keepalive send failed");
                    return;
                }
            }
            tokio::select! {
                () = cancel.cancelled() => return,
                () = sleep(reply_window) => {}
            }
            if *alive.borrow() == beats_before {
                warn!(
                    timeout_ms = self.settings.heartbeat_timeout_ms,
                    "keepalive reply missed; reconnecting"
                );
                self.begin_reconnect(SessionEvent::KeepaliveTimedOut);
                return;
            }
        }
    }

    /// Leave `Connected`, tear the current transport down, and re-dial the
    /// last-used address. No-op unless the session is actually connected —
    /// a racing close (or a second trigger) wins.
    fn begin_reconnect(self: &Arc<Self>, event: SessionEvent) {
        let url = {
            let mut inner = self.inner.lock();
            let Some(next) = transition(inner.state, event) else {
                return;
            };
            inner.state = next;
            if let Some(cancel) = inner.cancel.take() {
                cancel.cancel();
            }
            inner.sink = None;
            inner.url.clone()
        };
        let Some(url) = url else {
            return;
        };

        let session = Arc::clone(self);
        let _ = tokio::spawn(async move {
            if session.apply(SessionEvent::ConnectRequested).is_none() {
                return;
            }
            match session.dial(&url).await {
                Ok(parts) => {
                    if session.install(parts) {
                        info!(%url, "reconnected");
                    }
                }
                Err(err) => {
                    error!(%err, "reconnect failed");
                    let _ = session.apply(SessionEvent::HandshakeFailed);
                }
            }
        });
    }
}
