//! WebSocket transport using tokio-tungstenite.
//!
//! Each accepted connection gets a reader task (this module) and a writer
//! task. The reader turns inbound text frames into [`RegistryEvent`]s for
//! the single dispatch loop; the writer drains a per-connection outbound
//! queue into the WebSocket sink. Session objects hold a [`ConnectionHandle`]
//! and push frames into that queue without ever blocking on the socket.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

use crate::registry::{ConnectionId, RegistryEvent};

/// Maximum size of an inbound text frame. Protocol frames are an action
/// token plus a couple of short ids; anything larger is not this protocol
/// and the connection is closed.
pub const MAX_TEXT_FRAME_SIZE: usize = 1024;

/// Sender half of a connection's outbound queue.
pub type Outbound = mpsc::UnboundedSender<Message>;

/// Handle to an accepted connection, shared with the session objects.
///
/// Sends are fire-and-forget pushes into the writer task's queue; a send
/// on a connection that is already gone is dropped, never an error.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: Outbound,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbound: Outbound) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a text frame for delivery to this connection.
    pub fn send(&self, frame: impl Into<String>) {
        if self.outbound.send(Message::Text(frame.into())).is_err() {
            debug!(id = %self.id, "send to closed connection dropped");
        }
    }

    /// Initiate a close handshake on this connection.
    pub fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}

/// Spawn the accept loop: upgrades incoming TCP connections to WebSocket
/// and hands each one a connection task.
pub fn spawn_accept_loop(listener: TcpListener, events: mpsc::UnboundedSender<RegistryEvent>) {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let events = events.clone();
                    tokio::spawn(async move {
                        match tokio_tungstenite::accept_async(stream).await {
                            Ok(ws_stream) => {
                                connection_task(ws_stream, addr, events).await;
                            }
                            Err(e) => {
                                warn!(remote = %addr, error = %e, "WebSocket handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "TCP accept failed");
                }
            }
        }
    });
}

/// Drive one accepted WebSocket connection until it closes.
///
/// Registers with the dispatch loop (which assigns the connection id),
/// spawns the writer task, then runs the read loop on this task. The
/// `Closed` event is always the last event this connection emits.
async fn connection_task(
    ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
    remote: SocketAddr,
    events: mpsc::UnboundedSender<RegistryEvent>,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    let (id_tx, id_rx) = oneshot::channel();

    if events
        .send(RegistryEvent::Accepted {
            outbound: out_tx.clone(),
            id_tx,
        })
        .is_err()
    {
        return;
    }
    let Ok(id) = id_rx.await else {
        return;
    };
    debug!(id = %id, remote = %remote, "WebSocket connection accepted");

    // Writer: drains the outbound queue. A queued Close frame ends the
    // task after it is written, closing the socket from our side.
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader: runs on this task until the peer goes away.
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if text.len() > MAX_TEXT_FRAME_SIZE {
                    warn!(id = %id, len = text.len(), "text frame too large, closing connection");
                    break;
                }
                if events
                    .send(RegistryEvent::Frame {
                        id: id.clone(),
                        raw: text,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = out_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Binary and pong frames are not part of the protocol.
            }
            Err(e) => {
                debug!(id = %id, error = %e, "WebSocket read failed");
                break;
            }
        }
    }

    let _ = events.send(RegistryEvent::Closed { id: id.clone() });
    drop(out_tx);
    let _ = writer.await;
    debug!(id = %id, remote = %remote, "connection task ended");
}
