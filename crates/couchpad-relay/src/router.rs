//! Per-role message routing.
//!
//! Every handler validates the action against the sender's session state
//! before mutating anything (check-then-act, no rollback paths), then
//! performs the transition and queues the sends. Nothing in here may panic
//! the dispatch loop: unrecognized actions, short frames, and stale ids
//! all land in a logged drop.

use couchpad_core::actions;
use couchpad_core::codec::{self, Frame};
use tracing::{debug, warn};

use crate::registry::{Registry, Role};
use crate::session::{LobbySession, LobbyStatus, PlayerSession, PlayerStatus};

/// The authorization check at the heart of the protocol: a lobby may only
/// act on a player that is currently awaiting *that* lobby's decision.
///
/// Re-verified on every lobby-originated accept/reject, never cached —
/// the player may have left or disconnected since the lobby last looked.
pub fn lobby_may_address(player: &PlayerSession, lobby_id: &str) -> bool {
    player.status() == PlayerStatus::RequestedLobby && player.lobby_id() == Some(lobby_id)
}

/// First-message handling for a connection with no declared role.
///
/// Anything but an identity declaration is a protocol violation, and a
/// connection that will not identify is of no use to the relay: it is
/// closed.
pub(crate) fn identify(reg: &mut Registry, conn_id: &str, frame: &Frame) {
    match frame.action.as_str() {
        actions::IDENTIFY_AS_PLAYER => {
            let Some(conn) = reg.connections.get_mut(conn_id) else {
                return;
            };
            conn.role = Role::Player;
            let player = PlayerSession::new(conn.handle.clone());
            player.send(codec::encode(actions::IDENTIFY_AS_PLAYER_ACCEPT, &[conn_id]));
            reg.players.insert(conn_id.to_string(), player);
            debug!(id = %conn_id, "connection identified as a player");
        }
        actions::IDENTIFY_AS_LOBBY => {
            let Some(conn) = reg.connections.get_mut(conn_id) else {
                return;
            };
            conn.role = Role::Lobby;
            let lobby = LobbySession::new(conn.handle.clone());
            lobby.send(codec::encode(actions::IDENTIFY_AS_LOBBY_ACCEPT, &[conn_id]));
            reg.lobbies.insert(conn_id.to_string(), lobby);
            debug!(id = %conn_id, "connection identified as a lobby");
        }
        _ => {
            warn!(id = %conn_id, action = %frame.action, "non-identity first message");
            reg.close_connection(conn_id);
        }
    }
}

/// Route a frame from a connection declared as a player.
pub(crate) fn player_frame(reg: &mut Registry, player_id: &str, frame: &Frame) {
    let Some(min_args) = actions::expected_args(&frame.action) else {
        debug!(id = %player_id, action = %frame.action, "unrecognized action from player dropped");
        return;
    };
    if frame.args.len() < min_args {
        debug!(id = %player_id, action = %frame.action, "malformed frame from player dropped");
        return;
    }
    let Some(player) = reg.players.get_mut(player_id) else {
        return;
    };

    match frame.action.as_str() {
        actions::JOIN_LOBBY => {
            let (Some(lobby_id), Some(username)) = (frame.arg(0), frame.arg(1)) else {
                return;
            };
            if player.status() != PlayerStatus::NotInLobby {
                debug!(id = %player_id, "join request while already engaged dropped");
                return;
            }
            debug!(
                id = %player_id,
                lobby = %lobby_id,
                username = %username,
                "player wants to join lobby"
            );
            match reg.lobbies.get(lobby_id) {
                Some(lobby) if lobby.status() == LobbyStatus::Open => {
                    player.request_lobby(lobby_id);
                    lobby.send(codec::encode(actions::JOIN_LOBBY, &[player_id, username]));
                }
                Some(lobby) if lobby.status() == LobbyStatus::Started => {
                    player.send(actions::JOIN_LOBBY_REJECT_GAME_ALREADY_STARTED);
                }
                // Unknown id, or a lobby that has not opened yet.
                _ => {
                    player.send(actions::JOIN_LOBBY_REJECT_NO_SUCH_LOBBY);
                }
            }
        }

        actions::LEAVE_LOBBY => {
            if player.status() == PlayerStatus::InLobby {
                if let Some(lobby) = player
                    .lobby_id()
                    .and_then(|lobby_id| reg.lobbies.get_mut(lobby_id))
                {
                    debug!(id = %player_id, lobby = %lobby.id(), "player leaving lobby");
                    lobby.send(codec::encode(actions::LEAVE_LOBBY, &[player_id]));
                    lobby.remove_player(player_id);
                }
            }
            // Reset unconditionally: a player stuck in REQUESTED_LOBBY with
            // an unresponsive lobby must be able to leave and try again.
            player.leave_lobby();
            player.send(actions::LEAVE_LOBBY_ACCEPT);
        }

        actions::LEFT | actions::RIGHT | actions::JUMP => {
            if player.status() == PlayerStatus::InLobby {
                if let Some(lobby) = player
                    .lobby_id()
                    .and_then(|lobby_id| reg.lobbies.get(lobby_id))
                {
                    if lobby.status() == LobbyStatus::Started {
                        lobby.send(codec::encode(&frame.action, &[player_id]));
                    }
                }
            }
        }

        _ => {
            debug!(id = %player_id, action = %frame.action, "action not valid for a player dropped");
        }
    }
}

/// Route a frame from a connection declared as a lobby.
///
/// Lobbies never receive error replies for their own malformed requests;
/// everything invalid is logged and dropped.
pub(crate) fn lobby_frame(reg: &mut Registry, lobby_id: &str, frame: &Frame) {
    let Some(min_args) = actions::expected_args(&frame.action) else {
        debug!(id = %lobby_id, action = %frame.action, "unrecognized action from lobby dropped");
        return;
    };
    if frame.args.len() < min_args {
        debug!(id = %lobby_id, action = %frame.action, "malformed frame from lobby dropped");
        return;
    }

    match frame.action.as_str() {
        actions::JOIN_LOBBY_ACCEPT => {
            let Some(target) = frame.arg(0) else { return };
            let Some(player) = reg.players.get_mut(target) else {
                debug!(id = %lobby_id, player = %target, "accept for unknown player dropped");
                return;
            };
            if !lobby_may_address(player, lobby_id) {
                warn!(id = %lobby_id, player = %target, "unauthorized accept dropped");
                return;
            }
            let Some(lobby) = reg.lobbies.get_mut(lobby_id) else {
                return;
            };
            debug!(id = %lobby_id, player = %target, "lobby accepted player");
            player.join_lobby(lobby_id);
            lobby.add_player(target.to_string(), player.handle().clone());
            player.send(actions::JOIN_LOBBY_ACCEPT);
        }

        actions::JOIN_LOBBY_REJECT_GAME_ALREADY_STARTED
        | actions::JOIN_LOBBY_REJECT_LOBBY_FULL
        | actions::JOIN_LOBBY_REJECT_USERNAME_TAKEN => {
            let Some(target) = frame.arg(0) else { return };
            let Some(player) = reg.players.get_mut(target) else {
                debug!(id = %lobby_id, player = %target, "reject for unknown player dropped");
                return;
            };
            if !lobby_may_address(player, lobby_id) {
                warn!(id = %lobby_id, player = %target, "unauthorized reject dropped");
                return;
            }
            debug!(
                id = %lobby_id,
                player = %target,
                reason = %frame.action,
                "lobby rejected player"
            );
            player.leave_lobby();
            player.send(frame.action.clone());
        }

        actions::GAME_STARTED => {
            if let Some(lobby) = reg.lobbies.get_mut(lobby_id) {
                debug!(id = %lobby_id, "lobby started game");
                lobby.start();
            }
        }

        actions::LOBBY_OPEN => {
            if let Some(lobby) = reg.lobbies.get_mut(lobby_id) {
                debug!(id = %lobby_id, "lobby opened");
                lobby.open();
            }
        }

        actions::LOBBY_CLOSED => {
            let Some(lobby) = reg.lobbies.get_mut(lobby_id) else {
                return;
            };
            debug!(id = %lobby_id, "lobby closed");
            for member_id in lobby.close() {
                if let Some(member) = reg.players.get_mut(&member_id) {
                    member.leave_lobby();
                }
            }
        }

        _ => {
            debug!(id = %lobby_id, action = %frame.action, "action not valid for a lobby dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectionHandle;
    use tokio::sync::mpsc;

    fn player(id: &str) -> PlayerSession {
        let (tx, _rx) = mpsc::unbounded_channel();
        PlayerSession::new(ConnectionHandle::new(id.to_string(), tx))
    }

    #[test]
    fn authorization_requires_a_pending_request() {
        let p = player("p1");
        assert!(!lobby_may_address(&p, "l1"));
    }

    #[test]
    fn authorization_requires_the_matching_lobby() {
        let mut p = player("p1");
        p.request_lobby("l1");
        assert!(lobby_may_address(&p, "l1"));
        assert!(!lobby_may_address(&p, "l2"));
    }

    #[test]
    fn authorization_lapses_once_the_player_is_in() {
        let mut p = player("p1");
        p.request_lobby("l1");
        p.join_lobby("l1");
        // Already a member: accept/reject decisions no longer apply.
        assert!(!lobby_may_address(&p, "l1"));
    }

    #[test]
    fn authorization_lapses_after_leave() {
        let mut p = player("p1");
        p.request_lobby("l1");
        p.leave_lobby();
        assert!(!lobby_may_address(&p, "l1"));
    }
}
