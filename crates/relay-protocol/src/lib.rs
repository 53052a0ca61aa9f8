//! relay-protocol
//!
//! Wire layer for the message relay:
//!
//! - [`frame`]: the length-prefixed frame codec, one frame per logical message
//! - [`io`]: exact-count read/write loops the codec is built on
//!
//! Frame payloads are opaque to this crate. The relay happens to carry
//! text, but nothing here assumes an encoding.

pub mod frame;
pub mod io;

/// Conventional TCP port for the relay protocol.
pub const DEFAULT_PORT: u16 = 50204;

pub use frame::{encode_frame, read_frame, write_frame, FrameError, LEN_PREFIX_SIZE};
pub use io::{read_full, write_full, ReadOutcome};
