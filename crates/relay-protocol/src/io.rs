//! Exact-count read and write primitives.
//!
//! A stream transport has no message boundaries and no guarantee that one
//! read or write call moves the full requested count. These helpers loop
//! until the count is met or a terminal condition occurs:
//!
//! - a zero-byte read is an orderly close, reported with how much arrived
//! - `ErrorKind::Interrupted` is retried indefinitely
//! - any other error fails the whole operation immediately
//!
//! Would-block never reaches this layer; the runtime parks the task until
//! the socket is ready again.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Result of [`read_full`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The buffer was filled completely.
    Full,
    /// The peer closed first; the inner count (possibly zero) is how many
    /// bytes arrived before the close.
    Closed(usize),
}

/// Read exactly `buf.len()` bytes, or report an orderly close early.
pub async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<ReadOutcome>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => return Ok(ReadOutcome::Closed(filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(ReadOutcome::Full)
}

/// Write all of `buf`, looping over partial writes.
pub async fn write_full<W>(writer: &mut W, buf: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "write returned zero bytes",
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// ============================================================
//  Tests
// ============================================================

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn read_full_assembles_across_partial_reads() {
        // A tiny duplex buffer forces the payload through in pieces.
        let (mut tx, mut rx) = tokio::io::duplex(8);
        let payload: Vec<u8> = (0u8..64).collect();

        let writer = {
            let payload = payload.clone();
            tokio::spawn(async move {
                tx.write_all(&payload).await.expect("write side");
            })
        };

        let mut buf = vec![0u8; payload.len()];
        let outcome = read_full(&mut rx, &mut buf).await.expect("read side");
        writer.await.expect("writer task");

        assert_eq!(outcome, ReadOutcome::Full);
        assert_eq!(buf, payload);
    }

    #[tokio::test]
    async fn read_full_reports_close_with_partial_count() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(b"abc").await.expect("write");
        drop(tx);

        let mut buf = [0u8; 10];
        let outcome = read_full(&mut rx, &mut buf).await.expect("read");
        assert_eq!(outcome, ReadOutcome::Closed(3));
        assert_eq!(&buf[..3], b"abc");
    }

    #[tokio::test]
    async fn read_full_reports_immediate_close_as_zero() {
        let (tx, mut rx) = tokio::io::duplex(64);
        drop(tx);

        let mut buf = [0u8; 4];
        let outcome = read_full(&mut rx, &mut buf).await.expect("read");
        assert_eq!(outcome, ReadOutcome::Closed(0));
    }

    #[tokio::test]
    async fn read_full_with_empty_buffer_is_always_full() {
        let (tx, mut rx) = tokio::io::duplex(64);
        drop(tx);

        let mut buf = [0u8; 0];
        let outcome = read_full(&mut rx, &mut buf).await.expect("read");
        assert_eq!(outcome, ReadOutcome::Full);
    }

    #[tokio::test]
    async fn write_full_delivers_everything() {
        let (mut tx, mut rx) = tokio::io::duplex(16);
        let payload: Vec<u8> = (0u8..200).collect();

        let reader = tokio::spawn(async move {
            let mut buf = vec![0u8; 200];
            let outcome = read_full(&mut rx, &mut buf).await.expect("read side");
            assert_eq!(outcome, ReadOutcome::Full);
            buf
        });

        write_full(&mut tx, &payload).await.expect("write side");
        let received = reader.await.expect("reader task");
        assert_eq!(received, payload);
    }
}
