//! Controller-side session: one per player connection.

use crate::registry::ConnectionId;
use crate::transport::ConnectionHandle;

/// Where a player is in the join lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Initial state; also re-entered after every leave, rejection, or
    /// lobby teardown.
    NotInLobby,
    /// A join request has been forwarded to a lobby and no decision has
    /// arrived yet.
    RequestedLobby,
    /// Accepted by a lobby and present in its roster.
    InLobby,
}

/// State machine for one controller connection.
///
/// `lobby_id` is `Some` exactly when `status != NotInLobby`: it names the
/// lobby currently targeted (while requesting) or joined.
#[derive(Debug)]
pub struct PlayerSession {
    id: ConnectionId,
    handle: ConnectionHandle,
    status: PlayerStatus,
    lobby_id: Option<ConnectionId>,
}

impl PlayerSession {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            id: handle.id().to_string(),
            handle,
            status: PlayerStatus::NotInLobby,
            lobby_id: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// The lobby this player has requested or joined, if any.
    pub fn lobby_id(&self) -> Option<&str> {
        self.lobby_id.as_deref()
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Queue a frame for this player. Never blocks a state transition.
    pub fn send(&self, frame: impl Into<String>) {
        self.handle.send(frame);
    }

    /// The player has asked to join `lobby_id` and now awaits its decision.
    pub fn request_lobby(&mut self, lobby_id: &str) {
        self.lobby_id = Some(lobby_id.to_string());
        self.status = PlayerStatus::RequestedLobby;
    }

    /// The lobby accepted; the player is now a member.
    pub fn join_lobby(&mut self, lobby_id: &str) {
        self.lobby_id = Some(lobby_id.to_string());
        self.status = PlayerStatus::InLobby;
    }

    /// Reset to the initial state. Accepted unconditionally from any
    /// state so a player stuck awaiting a join decision can always retry.
    pub fn leave_lobby(&mut self) {
        self.lobby_id = None;
        self.status = PlayerStatus::NotInLobby;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn player(id: &str) -> PlayerSession {
        let (tx, _rx) = mpsc::unbounded_channel();
        PlayerSession::new(ConnectionHandle::new(id.to_string(), tx))
    }

    #[test]
    fn starts_outside_any_lobby() {
        let p = player("p1");
        assert_eq!(p.status(), PlayerStatus::NotInLobby);
        assert_eq!(p.lobby_id(), None);
    }

    #[test]
    fn request_then_join_tracks_the_lobby() {
        let mut p = player("p1");
        p.request_lobby("l1");
        assert_eq!(p.status(), PlayerStatus::RequestedLobby);
        assert_eq!(p.lobby_id(), Some("l1"));

        p.join_lobby("l1");
        assert_eq!(p.status(), PlayerStatus::InLobby);
        assert_eq!(p.lobby_id(), Some("l1"));
    }

    #[test]
    fn leave_is_idempotent_from_any_state() {
        let mut p = player("p1");
        p.request_lobby("l1");
        p.leave_lobby();
        assert_eq!(p.status(), PlayerStatus::NotInLobby);
        assert_eq!(p.lobby_id(), None);

        // A second leave changes nothing and does not error.
        p.leave_lobby();
        assert_eq!(p.status(), PlayerStatus::NotInLobby);
        assert_eq!(p.lobby_id(), None);
    }

    #[test]
    fn lobby_id_agrees_with_status() {
        let mut p = player("p1");
        assert!(p.lobby_id().is_none());
        p.request_lobby("l1");
        assert!(p.lobby_id().is_some());
        p.join_lobby("l1");
        assert!(p.lobby_id().is_some());
        p.leave_lobby();
        assert!(p.lobby_id().is_none());
    }
}
