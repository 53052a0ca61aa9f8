//! relay-core
//!
//! Shared state and ordering contracts for the message relay:
//!
//! - [`message`]: what gets relayed, and the broadcast line format
//! - [`queue`]: the FIFO hand-off between connection handlers and the broadcaster
//! - [`registry`]: the set of currently connected clients
//!
//! Socket handling lives in the binaries and wire framing in
//! `relay-protocol`; this crate never touches the network itself.

pub mod message;
pub mod queue;
pub mod registry;

pub use message::{text_lossy, Message, SYSTEM_SENDER};
pub use queue::MessageQueue;
pub use registry::{
    bounded_name, shared_writer, ClientId, ClientRegistry, ClientWriter, ConnectedClient,
    MAX_NAME_LEN,
};
