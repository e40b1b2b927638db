//! Connection registry: owns every live connection and its session record.
//!
//! The registry's three maps (connections, players, lobbies) are mutated
//! only from `handle_event`, which the server calls from a single dispatch
//! task — each event is handled to completion before the next, so there is
//! no locking anywhere in here. Reader tasks only ever *send* events;
//! session objects only ever *queue* outbound frames.

use std::collections::HashMap;

use couchpad_core::{actions, codec};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::router;
use crate::session::{LobbySession, PlayerSession, PlayerStatus};
use crate::transport::{ConnectionHandle, Outbound};

/// Server-assigned connection identifier. Shared verbatim with the peers
/// (a lobby shows its id on screen for players to type), so it is short.
pub type ConnectionId = String;

const CONNECTION_ID_LEN: usize = 8;

/// Events flowing from the transport tasks into the dispatch loop.
pub enum RegistryEvent {
    /// A WebSocket connection completed its handshake. The registry
    /// assigns the id and reports it back to the reader task.
    Accepted {
        outbound: Outbound,
        id_tx: oneshot::Sender<ConnectionId>,
    },
    /// A text frame arrived on a live connection.
    Frame { id: ConnectionId, raw: String },
    /// The connection is gone (clean close, error, or violation close).
    Closed { id: ConnectionId },
}

/// Declared role of a connection. Written exactly once, at identity
/// declaration; there is no way back to `Undeclared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Undeclared,
    Player,
    Lobby,
}

/// A live connection and its once-assigned role.
pub(crate) struct RegisteredConnection {
    pub(crate) handle: ConnectionHandle,
    pub(crate) role: Role,
}

/// Owner of all live connection/session records.
#[derive(Default)]
pub struct Registry {
    pub(crate) connections: HashMap<ConnectionId, RegisteredConnection>,
    pub(crate) players: HashMap<ConnectionId, PlayerSession>,
    pub(crate) lobbies: HashMap<ConnectionId, LobbySession>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live connections, any role.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Handle one transport event to completion.
    pub fn handle_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Accepted { outbound, id_tx } => self.accept(outbound, id_tx),
            RegistryEvent::Frame { id, raw } => self.dispatch_frame(&id, &raw),
            RegistryEvent::Closed { id } => self.remove(&id),
        }
    }

    /// Register a fresh connection with no role and report its id back to
    /// the reader task.
    fn accept(&mut self, outbound: Outbound, id_tx: oneshot::Sender<ConnectionId>) {
        let id = self.generate_id();
        let handle = ConnectionHandle::new(id.clone(), outbound);
        self.connections.insert(
            id.clone(),
            RegisteredConnection {
                handle,
                role: Role::Undeclared,
            },
        );
        if id_tx.send(id.clone()).is_err() {
            // The connection task died before learning its id, so it will
            // never report a close for it. Forget it now.
            self.connections.remove(&id);
            return;
        }
        debug!(id = %id, "connection registered");
    }

    /// Route a decoded frame according to the sender's declared role.
    fn dispatch_frame(&mut self, id: &str, raw: &str) {
        let role = match self.connections.get(id) {
            Some(conn) => conn.role,
            // Frame raced with the close handler; the sender is gone.
            None => return,
        };
        let frame = codec::decode(raw);
        match role {
            Role::Undeclared => router::identify(self, id, &frame),
            Role::Player => router::player_frame(self, id, &frame),
            Role::Lobby => router::lobby_frame(self, id, &frame),
        }
    }

    /// The close handler: the only place a session record is deleted.
    ///
    /// Cross-notification happens before the record goes away, and the
    /// whole path is idempotent — a second close for the same id is a
    /// no-op, as is a close for an id the registry never finished
    /// registering.
    fn remove(&mut self, id: &str) {
        let Some(conn) = self.connections.remove(id) else {
            return;
        };
        match conn.role {
            Role::Undeclared => {}
            Role::Player => {
                if let Some(player) = self.players.get(id) {
                    if player.status() == PlayerStatus::InLobby {
                        if let Some(lobby) = player
                            .lobby_id()
                            .and_then(|lobby_id| self.lobbies.get_mut(lobby_id))
                        {
                            lobby.send(codec::encode(actions::PLAYER_DISCONNECT, &[id]));
                            lobby.remove_player(id);
                        }
                    }
                }
                self.players.remove(id);
            }
            Role::Lobby => {
                if let Some(mut lobby) = self.lobbies.remove(id) {
                    for member_id in lobby.disconnect() {
                        if let Some(player) = self.players.get_mut(&member_id) {
                            player.leave_lobby();
                        }
                    }
                }
            }
        }
        debug!(id = %id, role = ?conn.role, "connection removed");
    }

    /// Flag a connection as a protocol violation and close it.
    pub(crate) fn close_connection(&mut self, id: &str) {
        if let Some(conn) = self.connections.remove(id) {
            warn!(id = %id, "closing connection after protocol violation");
            conn.handle.close();
        }
    }

    /// Generate a connection id that is unused for this registry's
    /// lifetime. Ids are handed to peers over the wire, so they are short
    /// alphanumeric tokens rather than UUIDs.
    fn generate_id(&self) -> ConnectionId {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (&mut rng)
                .sample_iter(Alphanumeric)
                .take(CONNECTION_ID_LEN)
                .map(char::from)
                .collect();
            if !self.connections.contains_key(&id) {
                return id;
            }
        }
    }
}
