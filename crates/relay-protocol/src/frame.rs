//! Length-prefixed frame codec.
//!
//! Every logical message on the wire is one frame:
//!
//! ```text
//! +------------------+------------------+
//! | length (u32, BE) |  payload bytes   |
//! +------------------+------------------+
//! ```
//!
//! No type tag, no checksum, and a zero-length frame is valid. The decoder
//! distinguishes an orderly close at a frame boundary (`Ok(None)`) from a
//! close once any of the frame has arrived ([`FrameError::Truncated`]):
//! in the latter case a length was promised and not delivered. No maximum
//! length is enforced, so a hostile peer can demand an arbitrarily large
//! allocation; that is a known limitation of the protocol.

use std::fmt;
use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::io::{read_full, write_full, ReadOutcome};

/// Size of the length prefix in bytes.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Errors surfaced by [`read_frame`] and [`write_frame`].
#[derive(Debug)]
pub enum FrameError {
    /// The peer closed partway through a frame: `got` of `expected` bytes
    /// of the current phase (length prefix or payload) had arrived.
    Truncated { expected: usize, got: usize },
    /// Transport failure other than an orderly close.
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated { expected, got } => {
                write!(f, "peer closed mid-frame: got {} of {} bytes", got, expected)
            }
            FrameError::Io(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        FrameError::Io(e)
    }
}

/// Encode one frame into a fresh buffer.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload);
    write_full(writer, &frame).await?;
    writer.flush().await
}

/// Read one frame.
///
/// - `Ok(Some(payload))`: a complete frame arrived (possibly empty).
/// - `Ok(None)`: the peer closed before any byte of the length prefix,
///   an orderly close at a frame boundary.
/// - `Err(FrameError::Truncated { .. })`: the peer closed mid-length or
///   mid-payload.
/// - `Err(FrameError::Io(_))`: transport failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Bytes>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LEN_PREFIX_SIZE];
    match read_full(reader, &mut len_buf).await? {
        ReadOutcome::Full => {}
        ReadOutcome::Closed(0) => return Ok(None),
        ReadOutcome::Closed(got) => {
            return Err(FrameError::Truncated {
                expected: LEN_PREFIX_SIZE,
                got,
            });
        }
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    match read_full(reader, &mut payload).await? {
        ReadOutcome::Full => Ok(Some(Bytes::from(payload))),
        ReadOutcome::Closed(got) => Err(FrameError::Truncated { expected: len, got }),
    }
}

// ============================================================
//  Tests
// ============================================================
