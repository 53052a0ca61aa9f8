//! relay-server
//!
//! Multi-client async TCP message relay. Every frame a client sends is
//! fanned out, formatted as `[name]: text`, to all currently connected
//! clients in global arrival order.

pub mod config;
pub mod server;

// internal modules, reached through `server`
mod broadcaster;
mod handler;

pub use handler::GREETING;
