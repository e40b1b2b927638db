//! couchpad-relay: WebSocket relay pairing shared-screen game hosts
//! ("lobbies") with phone controllers ("players").
//!
//! Neither side ever holds a direct connection to the other. The relay owns
//! the connection registry and the per-role session state machines, and its
//! router decides which connection may address which other connection, in
//! what state, with what side effects. Everything else — rendering, assets,
//! world generation — lives in the front ends and only ever sees the plain
//! text action vocabulary from `couchpad-core`.

pub mod config;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod transport;
