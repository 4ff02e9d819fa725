//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams engine events to clients. Clients
//! choose which topics (`match`, `changes`, `pool`, `synergies`) they
//! receive and can query the current match state.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
