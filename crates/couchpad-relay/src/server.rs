//! Core server: binds the listener and runs the dispatch loop.
//!
//! The dispatch loop is the single owner of the [`Registry`]; every
//! transport task funnels its events through one channel, and each event
//! is handled to completion before the next. Messages from one connection
//! are therefore processed in arrival order, and no ordering is promised
//! across connections.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use couchpad_core::{RelayError, RelayResult};

use crate::config::ServerConfig;
use crate::registry::Registry;
use crate::transport;

/// The relay server instance.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RelayServer {
    /// Bind the WebSocket listener. With port 0 the OS picks a free port;
    /// [`RelayServer::local_addr`] reports the actual one.
    pub async fn bind(config: ServerConfig) -> RelayResult<Self> {
        let bind_addr = SocketAddr::new(config.bind, config.port);
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| RelayError::Transport(format!("bind {bind_addr} failed: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| RelayError::Transport(format!("local_addr failed: {e}")))?;
        info!(addr = %local_addr, "WebSocket listener started");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections and dispatch their events until shutdown.
    pub async fn run(self) -> RelayResult<()> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        transport::spawn_accept_loop(self.listener, events_tx);

        let mut registry = Registry::new();
        while let Some(event) = events_rx.recv().await {
            registry.handle_event(event);
        }
        Ok(())
    }
}
