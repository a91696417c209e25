//! Resilient notification stream
//!
//! One [`NotifyStream`] per subscription keeps a WebSocket to the upstream
//! open for the lifetime of the process. Events go down a bounded channel;
//! the cursor is committed to the continuation store when an event gets a
//! slot, just before it is sent. A slow dispatcher pushes back on the socket
//! instead of queueing without limit, while heartbeats keep flowing.
//!
//! ```text
//!   read cursor ─► connect ─► await ready (timeout) ─► live ─┐
//!        ▲                                                    │
//!        └──────────── fixed delay ◄──── closed / failed ◄────┘
//! ```

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::continuation::{initial_cursor, ContinuationStore};
use crate::error::TransportError;
use crate::protocol::{Payload, VideoNotification};
use crate::session::{ConnectionPhase, ConnectionSnapshot, ConnectionState, Subscription};

use super::config::StreamConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection attempt ended
#[derive(Debug)]
enum SessionEnd {
    /// Shutdown requested
    Shutdown,
    /// The event receiver was dropped; nobody is listening any more
    ChannelClosed,
    /// Transport failure, reconnect
    Failed(TransportError),
}

/// What to do after a text frame
enum FrameOutcome {
    Continue,
    /// Handshake accepted, with the heartbeat interval if any
    Live(Option<std::time::Duration>),
    /// Event to forward once the channel has room
    Event(Box<VideoNotification>),
}

/// Self-healing upstream connection for one subscription
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use notify_relay::client::{NotifyStream, StreamConfig};
/// use notify_relay::continuation::MemoryContinuationStore;
/// use notify_relay::protocol::Endpoint;
/// use notify_relay::session::Subscription;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> notify_relay::error::Result<()> {
/// let config = StreamConfig::new(Endpoint::parse("https://vtracker.example")?);
/// let subscription = Subscription::new("all", 1, "token")?;
/// let store = Arc::new(MemoryContinuationStore::new());
///
/// let (stream, mut events) = NotifyStream::new(subscription, config, store);
/// let shutdown = CancellationToken::new();
/// stream.spawn(shutdown.clone());
///
/// while let Some(event) = events.recv().await {
///     println!("{} {}", event.event_type, event.video_title);
/// }
/// # Ok(())
/// # }
/// ```
pub struct NotifyStream {
    subscription: Subscription,
    config: StreamConfig,
    store: Arc<dyn ContinuationStore>,
    state: ConnectionState,
    event_tx: mpsc::Sender<VideoNotification>,
    state_tx: watch::Sender<ConnectionSnapshot>,
}

impl NotifyStream {
    /// Create a stream client.
    ///
    /// Returns the client and the receiving end of its event channel.
    pub fn new(
        subscription: Subscription,
        config: StreamConfig,
        store: Arc<dyn ContinuationStore>,
    ) -> (Self, mpsc::Receiver<VideoNotification>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);

        let state = ConnectionState::new(subscription.key.clone(), 0);
        let (state_tx, _) = watch::channel(state.snapshot());

        let stream = Self {
            subscription,
            config,
            store,
            state,
            event_tx,
            state_tx,
        };

        (stream, event_rx)
    }

    /// Observe connection state changes
    pub fn watch(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Run on a new task until `shutdown` is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Read the cursor, then connect and reconnect until `shutdown` is
    /// cancelled or the event receiver is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        self.state.cursor = self.read_cursor().await;
        self.publish();

        tracing::info!(
            subscription = %self.subscription.key,
            source_id = self.subscription.source_id,
            cursor = self.state.cursor,
            "Stream client starting"
        );

        loop {
            match self.connect_once(&shutdown).await {
                SessionEnd::Shutdown => break,
                SessionEnd::ChannelClosed => {
                    tracing::warn!(
                        subscription = %self.subscription.key,
                        "Event receiver dropped, stopping stream client"
                    );
                    break;
                }
                SessionEnd::Failed(_) => {}
            }

            tracing::debug!(
                subscription = %self.subscription.key,
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Reconnect scheduled"
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        tracing::info!(
            subscription = %self.subscription.key,
            cursor = self.state.cursor,
            "Stream client stopped"
        );
    }

    async fn read_cursor(&self) -> i64 {
        let key = &self.subscription.key;

        match self.store.read(key).await {
            Ok(Some(cursor)) => cursor,
            Ok(None) => {
                tracing::info!(subscription = %key, "No stored continuation, starting from now");
                initial_cursor()
            }
            Err(e) => {
                tracing::error!(
                    subscription = %key,
                    error = %e,
                    "Failed to read continuation, starting from now"
                );
                initial_cursor()
            }
        }
    }

    /// One connection attempt, from connect to close
    async fn connect_once(&mut self, shutdown: &CancellationToken) -> SessionEnd {
        self.state.begin_connect();
        self.publish();

        let url = self.config.endpoint.listen_url(
            self.subscription.source_id,
            &self.subscription.token,
            self.state.cursor,
        );

        tracing::debug!(
            subscription = %self.subscription.key,
            attempt = self.state.attempts,
            cursor = self.state.cursor,
            "Connecting to notification server"
        );

        let connected = tokio::select! {
            _ = shutdown.cancelled() => {
                self.mark_closed();
                return SessionEnd::Shutdown;
            }
            result = tokio_tungstenite::connect_async(url.as_str()) => result,
        };

        let socket = match connected {
            Ok((socket, _response)) => socket,
            Err(e) => {
                tracing::error!(
                    subscription = %self.subscription.key,
                    attempt = self.state.attempts,
                    error = %e,
                    "Socket connect failed"
                );
                self.mark_closed();
                return SessionEnd::Failed(TransportError::Connect(e.to_string()));
            }
        };

        self.state.opened();
        self.publish();
        tracing::info!(
            subscription = %self.subscription.key,
            "Connected to notification server"
        );

        let end = self.run_session(socket, shutdown).await;

        let uptime_ms = self.state.uptime().map(|d| d.as_millis() as u64);
        self.mark_closed();

        if let SessionEnd::Failed(ref e) = end {
            tracing::info!(
                subscription = %self.subscription.key,
                uptime_ms = ?uptime_ms,
                reason = %e,
                "Connection closed"
            );
        }

        end
    }

    /// Drive an open socket until it closes
    ///
    /// While an event waits for room in the channel no further frames are
    /// read, but heartbeats and shutdown are still serviced.
    async fn run_session(&mut self, socket: Socket, shutdown: &CancellationToken) -> SessionEnd {
        let (mut sink, mut frames) = socket.split();
        let events = self.event_tx.clone();

        let handshake_timeout = self.config.handshake_timeout;
        let handshake_deadline = tokio::time::sleep(handshake_timeout);
        tokio::pin!(handshake_deadline);

        let mut heartbeat: Option<Interval> = None;
        let mut pending: Option<VideoNotification> = None;

        loop {
            let awaiting_handshake = self.state.phase == ConnectionPhase::AwaitingHandshake;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    if let Some(ref event) = pending {
                        tracing::debug!(
                            subscription = %self.subscription.key,
                            video_id = %event.video_id,
                            "Dropping uncommitted event on shutdown"
                        );
                    }
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }

                _ = &mut handshake_deadline, if awaiting_handshake => {
                    self.state.stats.handshake_timeouts += 1;
                    tracing::warn!(
                        subscription = %self.subscription.key,
                        timeout_ms = handshake_timeout.as_millis() as u64,
                        "No ready frame within handshake timeout, closing"
                    );
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Failed(TransportError::HandshakeTimeout(handshake_timeout));
                }

                _ = next_tick(&mut heartbeat) => {
                    let text = match Payload::heartbeat_now().encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode heartbeat");
                            continue;
                        }
                    };

                    if let Err(e) = sink.send(Message::Text(text)).await {
                        return SessionEnd::Failed(TransportError::Closed(e.to_string()));
                    }
                    self.state.stats.heartbeats_sent += 1;
                    tracing::trace!(subscription = %self.subscription.key, "Heartbeat sent");
                }

                permit = events.reserve(), if pending.is_some() => {
                    let Ok(permit) = permit else {
                        let _ = sink.send(Message::Close(None)).await;
                        return SessionEnd::ChannelClosed;
                    };
                    if let Some(event) = pending.take() {
                        self.commit_cursor(&event).await;
                        permit.send(event);
                    }
                }

                frame = frames.next(), if pending.is_none() => match frame {
                    None => {
                        return SessionEnd::Failed(TransportError::Closed("stream ended".into()));
                    }
                    Some(Err(e)) => {
                        return SessionEnd::Failed(TransportError::Closed(e.to_string()));
                    }
                    Some(Ok(Message::Text(text))) => match self.handle_text(&text) {
                        FrameOutcome::Continue => {}
                        FrameOutcome::Live(interval) => heartbeat = interval.map(heartbeat_timer),
                        FrameOutcome::Event(event) => pending = Some(*event),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = match frame {
                            Some(frame) => format!("{} {}", u16::from(frame.code), frame.reason),
                            None => "no close frame".to_string(),
                        };
                        return SessionEnd::Failed(TransportError::Closed(reason));
                    }
                    // Pings are answered by tungstenite; binary frames are not part of the protocol
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    fn handle_text(&mut self, text: &str) -> FrameOutcome {
        let payload = match Payload::decode(text) {
            Ok(payload) => payload,
            Err(e) => {
                self.state.stats.malformed_frames += 1;
                tracing::warn!(
                    subscription = %self.subscription.key,
                    error = %e,
                    "Dropping malformed frame"
                );
                return FrameOutcome::Continue;
            }
        };

        match payload {
            Payload::Ready(ready) => {
                if !self.state.on_ready(&ready) {
                    tracing::warn!(
                        subscription = %self.subscription.key,
                        connection_id = %ready.connection_id,
                        "Ignoring unexpected ready frame"
                    );
                    return FrameOutcome::Continue;
                }

                self.publish();
                tracing::info!(
                    subscription = %self.subscription.key,
                    connection_id = %ready.connection_id,
                    user_id = %ready.user_id,
                    trace_id = %ready.trace_id,
                    heartbeat_interval_ms = ready.heartbeat_interval,
                    "Notification stream ready"
                );
                FrameOutcome::Live(self.state.heartbeat_interval)
            }
            Payload::YoutubeVideoNotify(event) => {
                tracing::debug!(
                    subscription = %self.subscription.key,
                    video_id = %event.video_id,
                    event_type = %event.event_type,
                    "Event received"
                );
                FrameOutcome::Event(Box::new(event))
            }
            Payload::Heartbeat(_) | Payload::Unknown => {
                tracing::debug!(subscription = %self.subscription.key, "Ignoring frame");
                FrameOutcome::Continue
            }
        }
    }

    /// Advance and persist the cursor for an event about to be forwarded
    async fn commit_cursor(&mut self, event: &VideoNotification) {
        let cursor = self.state.advance_cursor(event.timestamp);

        if let Err(e) = self.store.write(&self.subscription.key, cursor).await {
            self.state.stats.store_failures += 1;
            tracing::error!(
                subscription = %self.subscription.key,
                cursor = cursor,
                error = %e,
                "Failed to persist continuation"
            );
        }
        self.publish();
    }

    fn mark_closed(&mut self) {
        if self.state.closed() {
            self.publish();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.snapshot());
    }
}

fn heartbeat_timer(period: std::time::Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Next heartbeat tick, or never if heartbeats are not running
async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
