//! Wire action vocabulary.
//!
//! Every frame's first token is one of these actions. The remaining tokens
//! are positional arguments whose meaning depends on the action and on the
//! direction of travel (see [`expected_args`] for the inbound grammar).

/// First message from a controller connection.
pub const IDENTIFY_AS_PLAYER: &str = "IDENTIFY_AS_PLAYER";
/// First message from a host connection.
pub const IDENTIFY_AS_LOBBY: &str = "IDENTIFY_AS_LOBBY";
/// Reply to a player identification; carries the assigned connection id.
pub const IDENTIFY_AS_PLAYER_ACCEPT: &str = "IDENTIFY_AS_PLAYER_ACCEPT";
/// Reply to a lobby identification; carries the assigned connection id,
/// which the host displays for players to type in.
pub const IDENTIFY_AS_LOBBY_ACCEPT: &str = "IDENTIFY_AS_LOBBY_ACCEPT";

/// From a player: `JOIN_LOBBY <lobbyId> <username>`.
/// Forwarded to the lobby as `JOIN_LOBBY <playerId> <username>`.
pub const JOIN_LOBBY: &str = "JOIN_LOBBY";
/// From a lobby: `JOIN_LOBBY_ACCEPT <playerId>`. Forwarded to the player
/// without arguments.
pub const JOIN_LOBBY_ACCEPT: &str = "JOIN_LOBBY_ACCEPT";
/// Sent by the relay itself when the target lobby does not exist or is
/// not open.
pub const JOIN_LOBBY_REJECT_NO_SUCH_LOBBY: &str = "JOIN_LOBBY_REJECT_NO_SUCH_LOBBY";
/// From a lobby whose roster is at capacity: `<action> <playerId>`.
pub const JOIN_LOBBY_REJECT_LOBBY_FULL: &str = "JOIN_LOBBY_REJECT_LOBBY_FULL";
/// From a lobby when the requested username is already in use:
/// `<action> <playerId>`.
pub const JOIN_LOBBY_REJECT_USERNAME_TAKEN: &str = "JOIN_LOBBY_REJECT_USERNAME_TAKEN";
/// Sent by the relay when the target lobby has already started its game;
/// also relayed from a lobby that decides the same.
pub const JOIN_LOBBY_REJECT_GAME_ALREADY_STARTED: &str = "JOIN_LOBBY_REJECT_GAME_ALREADY_STARTED";

/// From a player, no arguments. Forwarded to its lobby as
/// `LEAVE_LOBBY <playerId>` when the player was a member.
pub const LEAVE_LOBBY: &str = "LEAVE_LOBBY";
/// Acknowledgment of a leave, sent to the player.
pub const LEAVE_LOBBY_ACCEPT: &str = "LEAVE_LOBBY_ACCEPT";

/// Movement token. Forwarded to the lobby as `LEFT <playerId>`.
pub const LEFT: &str = "LEFT";
/// Movement token. Forwarded to the lobby as `RIGHT <playerId>`.
pub const RIGHT: &str = "RIGHT";
/// Movement token. Forwarded to the lobby as `JUMP <playerId>`.
pub const JUMP: &str = "JUMP";

/// From a lobby, no arguments; broadcast verbatim to every member.
pub const GAME_STARTED: &str = "GAME_STARTED";
/// From a lobby, no arguments.
pub const LOBBY_OPEN: &str = "LOBBY_OPEN";
/// Acknowledgment of an open, sent to the lobby.
pub const LOBBY_OPEN_ACCEPT: &str = "LOBBY_OPEN_ACCEPT";
/// From a lobby, no arguments.
pub const LOBBY_CLOSED: &str = "LOBBY_CLOSED";
/// Acknowledgment of a close, sent to the lobby.
pub const LOBBY_CLOSED_ACCEPT: &str = "LOBBY_CLOSED_ACCEPT";
/// Broadcast to members when their lobby's connection drops.
pub const LOBBY_DISCONNECT: &str = "LOBBY_DISCONNECT";
/// Sent to a lobby when a member player's connection drops:
/// `PLAYER_DISCONNECT <playerId>`.
pub const PLAYER_DISCONNECT: &str = "PLAYER_DISCONNECT";

/// Minimum argument count the relay requires for an inbound action.
///
/// Returns `None` for actions the relay never accepts from a client
/// (unknown actions and relay-originated acknowledgments alike). Extra
/// trailing tokens are permitted and ignored, so this is a floor, not an
/// exact count.
pub fn expected_args(action: &str) -> Option<usize> {
    match action {
        IDENTIFY_AS_PLAYER | IDENTIFY_AS_LOBBY => Some(0),
        JOIN_LOBBY => Some(2),
        JOIN_LOBBY_ACCEPT
        | JOIN_LOBBY_REJECT_LOBBY_FULL
        | JOIN_LOBBY_REJECT_USERNAME_TAKEN
        | JOIN_LOBBY_REJECT_GAME_ALREADY_STARTED => Some(1),
        LEAVE_LOBBY | LEFT | RIGHT | JUMP => Some(0),
        GAME_STARTED | LOBBY_OPEN | LOBBY_CLOSED => Some(0),
        _ => None,
    }
}
