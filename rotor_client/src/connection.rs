use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};
use url::Url;

use crate::router::Router;

/// Silence longer than this while connected counts as a dead link.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_millis(5000);
/// Fixed delay before the single scheduled reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Lifecycle state of the one device link. `Stale` is transient: the
/// liveness timer publishes it right before forcing the socket closed,
/// which funnels into the ordinary disconnect/reconnect path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Stale,
}

impl LinkState {
    pub fn is_lost(self) -> bool {
        matches!(self, LinkState::Disconnected | LinkState::Stale)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// `ws://...` address of the controller, environment configuration.
    pub endpoint: String,
    pub liveness_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl ConnectionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            liveness_timeout: LIVENESS_TIMEOUT,
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

/// Connection actor. Owns the websocket for the client's whole
/// lifetime: connects, pumps frames both ways, watches liveness and
/// reconnects after the fixed delay. Being the only place that ever
/// reconnects, at most one reconnect sleep is pending at any time no
/// matter how close events pile up. Returns when the outbound channel
/// closes.
pub async fn run(
    cfg: ConnectionConfig,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    router: Router,
    link_tx: watch::Sender<LinkState>,
) {
    if let Err(e) = Url::parse(&cfg.endpoint) {
        error!(endpoint = %cfg.endpoint, error = %e, "invalid websocket endpoint");
        return;
    }

    loop {
        let _ = link_tx.send(LinkState::Connecting);
        // Frames submitted mid-handshake are dropped the same as during
        // the reconnect sleep; nothing is queued for the opening link.
        let connected = {
            let connect = tokio_tungstenite::connect_async(&cfg.endpoint);
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    result = &mut connect => break result,
                    next = outbound_rx.recv() => {
                        let Some(frame) = next else { return };
                        debug!(frame, "not connected, dropping outbound frame");
                    }
                }
            }
        };
        let socket = match connected {
            Ok((socket, _)) => socket,
            Err(e) => {
                debug!(endpoint = %cfg.endpoint, error = %e, "connect failed");
                let _ = link_tx.send(LinkState::Disconnected);
                if !wait_and_drop(&cfg, &mut outbound_rx).await {
                    return;
                }
                continue;
            }
        };
        debug!(endpoint = %cfg.endpoint, "connected");
        let _ = link_tx.send(LinkState::Connected);

        let (mut write, mut read) = socket.split();
        let mut last_frame = Instant::now();
        let mut liveness =
            interval_at(Instant::now() + cfg.liveness_timeout, cfg.liveness_timeout);

        'conn: loop {
            tokio::select! {
                next = outbound_rx.recv() => {
                    let Some(frame) = next else {
                        let _ = write.close().await;
                        return;
                    };
                    if write.send(Message::Text(frame.into())).await.is_err() {
                        break 'conn;
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            last_frame = Instant::now();
                            if let Err(e) = router.dispatch(&text) {
                                warn!(error = %e, "dropping inbound frame");
                            }
                        }
                        // Ping/pong are answered below us and binary is
                        // not part of the protocol.
                        Some(Ok(Message::Close(_))) | None => break 'conn,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(error = %e, "socket error");
                            break 'conn;
                        }
                    }
                }
                _ = liveness.tick() => {
                    if last_frame.elapsed() >= cfg.liveness_timeout {
                        warn!(endpoint = %cfg.endpoint, "no frames within liveness window, closing");
                        let _ = link_tx.send(LinkState::Stale);
                        break 'conn;
                    }
                }
            }
        }

        // Idempotent force close. Remote-initiated closes land here as
        // well, so every disconnect funnels into one reconnect sleep.
        let _ = write.close().await;
        let _ = link_tx.send(LinkState::Disconnected);
        if !wait_and_drop(&cfg, &mut outbound_rx).await {
            return;
        }
    }
}

/// Sleep out the reconnect delay. Frames submitted while disconnected
/// are dropped, not queued. Returns false once the client side is gone.
async fn wait_and_drop(
    cfg: &ConnectionConfig,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
) -> bool {
    let delay = sleep(cfg.reconnect_delay);
    tokio::pin!(delay);
    loop {
        tokio::select! {
            _ = &mut delay => return true,
            next = outbound_rx.recv() => {
                match next {
                    Some(frame) => debug!(frame, "not connected, dropping outbound frame"),
                    None => return false,
                }
            }
        }
    }
}
