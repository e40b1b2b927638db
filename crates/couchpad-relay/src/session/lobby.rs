//! Host-side session: one per lobby connection, owning the member roster.

use std::collections::HashMap;

use couchpad_core::actions;

use crate::registry::ConnectionId;
use crate::transport::ConnectionHandle;

/// Whether a lobby is accepting player connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStatus {
    /// Initial state; not accepting join requests.
    Closed,
    /// Accepting join requests.
    Open,
    /// Game underway; no further joins, movement flows.
    Started,
}

/// State machine for one host connection.
///
/// `members` maps player id to that player's connection handle. It only
/// ever contains players whose own state says they are in this lobby; the
/// router keeps both sides of that invariant in step.
#[derive(Debug)]
pub struct LobbySession {
    id: ConnectionId,
    handle: ConnectionHandle,
    status: LobbyStatus,
    members: HashMap<ConnectionId, ConnectionHandle>,
}

impl LobbySession {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            id: handle.id().to_string(),
            handle,
            status: LobbyStatus::Closed,
            members: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, player_id: &str) -> bool {
        self.members.contains_key(player_id)
    }

    /// Queue a frame for the lobby's own connection.
    pub fn send(&self, frame: impl Into<String>) {
        self.handle.send(frame);
    }

    /// Queue a frame for every current member.
    pub fn broadcast(&self, frame: &str) {
        for member in self.members.values() {
            member.send(frame);
        }
    }

    /// Add an accepted player to the roster.
    pub fn add_player(&mut self, player_id: ConnectionId, handle: ConnectionHandle) {
        self.members.insert(player_id, handle);
    }

    /// Remove a player from the roster.
    pub fn remove_player(&mut self, player_id: &str) {
        self.members.remove(player_id);
    }

    /// Open the lobby to join requests and acknowledge the host.
    pub fn open(&mut self) {
        self.status = LobbyStatus::Open;
        self.send(actions::LOBBY_OPEN_ACCEPT);
    }

    /// Start the game: every member is told, none is removed.
    pub fn start(&mut self) {
        self.status = LobbyStatus::Started;
        self.broadcast(actions::GAME_STARTED);
    }

    /// Close the lobby: tell every member, drain the roster, acknowledge
    /// the host. Returns the former members' ids so the caller — the sole
    /// owner of the player records — can reset each one.
    pub fn close(&mut self) -> Vec<ConnectionId> {
        self.broadcast(actions::LOBBY_CLOSED);
        let former: Vec<ConnectionId> = self.members.drain().map(|(id, _)| id).collect();
        self.send(actions::LOBBY_CLOSED_ACCEPT);
        self.status = LobbyStatus::Closed;
        former
    }

    /// Teardown after the lobby's connection dropped: tell every member
    /// and drain the roster. No acknowledgment — the host is already gone.
    /// Returns the former members' ids, as [`LobbySession::close`] does.
    pub fn disconnect(&mut self) -> Vec<ConnectionId> {
        self.broadcast(actions::LOBBY_DISCONNECT);
        self.members.drain().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    fn handle(id: &str) -> (ConnectionHandle, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(id.to_string(), tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            frames.push(text);
        }
        frames
    }

    #[test]
    fn starts_closed_and_empty() {
        let (h, _rx) = handle("l1");
        let lobby = LobbySession::new(h);
        assert_eq!(lobby.status(), LobbyStatus::Closed);
        assert_eq!(lobby.member_count(), 0);
    }

    #[test]
    fn open_acknowledges_the_host() {
        let (h, mut rx) = handle("l1");
        let mut lobby = LobbySession::new(h);
        lobby.open();
        assert_eq!(lobby.status(), LobbyStatus::Open);
        assert_eq!(drain(&mut rx), vec!["LOBBY_OPEN_ACCEPT"]);
    }

    #[test]
    fn start_notifies_members_but_keeps_them() {
        let (h, _rx) = handle("l1");
        let (ph, mut prx) = handle("p1");
        let mut lobby = LobbySession::new(h);
        lobby.open();
        lobby.add_player("p1".to_string(), ph);

        lobby.start();
        assert_eq!(lobby.status(), LobbyStatus::Started);
        assert_eq!(lobby.member_count(), 1);
        assert_eq!(drain(&mut prx), vec!["GAME_STARTED"]);
    }

    #[test]
    fn close_tells_members_then_acknowledges_host() {
        let (h, mut hrx) = handle("l1");
        let (pa, mut parx) = handle("p1");
        let (pb, mut pbrx) = handle("p2");
        let mut lobby = LobbySession::new(h);
        lobby.open();
        lobby.add_player("p1".to_string(), pa);
        lobby.add_player("p2".to_string(), pb);

        let mut former = lobby.close();
        former.sort();
        assert_eq!(former, vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(lobby.status(), LobbyStatus::Closed);
        assert_eq!(lobby.member_count(), 0);
        assert_eq!(drain(&mut parx), vec!["LOBBY_CLOSED"]);
        assert_eq!(drain(&mut pbrx), vec!["LOBBY_CLOSED"]);
        // The host hears the open ack first, then the close ack.
        assert_eq!(
            drain(&mut hrx),
            vec!["LOBBY_OPEN_ACCEPT", "LOBBY_CLOSED_ACCEPT"]
        );
    }

    #[test]
    fn disconnect_tells_members_without_acknowledgment() {
        let (h, mut hrx) = handle("l1");
        let (ph, mut prx) = handle("p1");
        let mut lobby = LobbySession::new(h);
        lobby.open();
        let _ = drain(&mut hrx);
        lobby.add_player("p1".to_string(), ph);

        let former = lobby.disconnect();
        assert_eq!(former, vec!["p1".to_string()]);
        assert_eq!(lobby.member_count(), 0);
        assert_eq!(drain(&mut prx), vec!["LOBBY_DISCONNECT"]);
        assert!(drain(&mut hrx).is_empty());
    }
}
