//! Per-role session state machines.
//!
//! A session object exists from the moment its connection declares a role
//! to the moment the connection closes. The state machines themselves are
//! deliberately permissive — transition legality is the router's job, and
//! is validated there before any method here is called.

pub mod lobby;
pub mod player;

pub use lobby::{LobbySession, LobbyStatus};
pub use player::{PlayerSession, PlayerStatus};
