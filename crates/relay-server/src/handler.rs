//! Per-connection state machine: handshake, relay loop, cleanup.
//!
//! A connection moves through three phases. Handshaking sends the greeting
//! frame and reads exactly one frame as the display name; only then is the
//! client registered and announced. Relaying turns every further frame
//! into one queued message. Closing runs exactly once, whatever path ended
//! the session, and is the only place the client is deregistered.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use relay_core::{
    bounded_name, shared_writer, ClientId, ClientRegistry, ClientWriter, ConnectedClient, Message,
    MessageQueue,
};
use relay_protocol::frame::{read_frame, write_frame, FrameError};

/// Greeting frame sent to every new connection before the name exchange.
pub const GREETING: &str = "Hello! Please select your name: ";

/// How a session ended, for the close log line.
enum SessionEnd {
    /// Orderly close at a frame boundary, after a completed handshake.
    Disconnected { name: String },
    /// The peer went away before a name frame arrived.
    HandshakeIncomplete,
    /// Transport failure, during or after the handshake.
    Failed {
        name: Option<String>,
        error: FrameError,
    },
}

/// Drive one client connection to completion.
///
/// Owns the socket for the connection's lifetime. Registration and the
/// matching removal both happen here and nowhere else; removal runs on
/// every exit path, and removing a never-registered id is a no-op.
pub async fn run<S>(
    id: ClientId,
    stream: S,
    peer: SocketAddr,
    registry: Arc<ClientRegistry>,
    queue: Arc<MessageQueue>,
) where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, write_half) = tokio::io::split(stream);
    let writer = shared_writer(write_half);

    let end = drive(id, &mut reader, &writer, peer, &registry, &queue).await;

    registry.remove(id).await;

    match end {
        SessionEnd::Disconnected { name } => {
            info!(client = id.0, name = %name, peer = %peer, "client disconnected");
        }
        SessionEnd::HandshakeIncomplete => {
            debug!(client = id.0, peer = %peer, "connection closed before a name arrived");
        }
        SessionEnd::Failed { name, error } => {
            warn!(
                client = id.0,
                name = name.as_deref().unwrap_or("<unnamed>"),
                peer = %peer,
                error = %error,
                "connection failed"
            );
        }
    }
}

/// The handshake and relay phases; the caller owns cleanup.
async fn drive<R>(
    id: ClientId,
    reader: &mut R,
    writer: &ClientWriter,
    peer: SocketAddr,
    registry: &ClientRegistry,
    queue: &MessageQueue,
) -> SessionEnd
where
    R: AsyncRead + Unpin,
{
    {
        let mut w = writer.lock().await;
        if let Err(e) = write_frame(&mut *w, GREETING.as_bytes()).await {
            return SessionEnd::Failed {
                name: None,
                error: e.into(),
            };
        }
    }

    let name = match read_frame(reader).await {
        Ok(Some(raw)) => bounded_name(&raw),
        Ok(None) => return SessionEnd::HandshakeIncomplete,
        Err(e) => {
            return SessionEnd::Failed {
                name: None,
                error: e,
            }
        }
    };

    registry
        .add(ConnectedClient {
            id,
            name: name.clone(),
            addr: peer,
            writer: writer.clone(),
        })
        .await;
    info!(client = id.0, name = %name, peer = %peer, "client connected");
    queue.push(Message::system(format!("{} connected", name))).await;

    loop {
        match read_frame(reader).await {
            Ok(Some(payload)) => {
                debug!(client = id.0, name = %name, bytes = payload.len(), "frame received");
                queue.push(Message::from_client(name.clone(), payload)).await;
            }
            Ok(None) => {
                // The notice goes through the queue like any other message,
                // so everything the client said is delivered first.
                queue
                    .push(Message::system(format!("{} disconnected.", name)))
                    .await;
                return SessionEnd::Disconnected { name };
            }
            Err(e) => {
                return SessionEnd::Failed {
                    name: Some(name),
                    error: e,
                }
            }
        }
    }
}

// ============================================================
//  Tests
// ============================================================

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use relay_core::{MAX_NAME_LEN, SYSTEM_SENDER};

    use super::*;

    fn test_peer() -> SocketAddr {
        "127.0.0.1:0".parse().expect("test addr")
    }

    async fn spawn_handler(
        stream: tokio::io::DuplexStream,
    ) -> (
        Arc<ClientRegistry>,
        Arc<MessageQueue>,
        tokio::task::JoinHandle<()>,
    ) {
        let registry = Arc::new(ClientRegistry::new());
        let queue = Arc::new(MessageQueue::new());
        let task = tokio::spawn(run(
            ClientId::next(),
            stream,
            test_peer(),
            registry.clone(),
            queue.clone(),
        ));
        (registry, queue, task)
    }

    #[tokio::test]
    async fn greeting_is_sent_before_anything_else() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (_registry, _queue, task) = spawn_handler(server_side).await;

        let greeting = read_frame(&mut client)
            .await
            .expect("read greeting")
            .expect("open");
        assert_eq!(&greeting[..], GREETING.as_bytes());

        drop(client);
        task.await.expect("handler task");
    }

    #[tokio::test]
    async fn unnamed_connection_is_never_registered_or_announced() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (registry, queue, task) = spawn_handler(server_side).await;

        let _greeting = read_frame(&mut client).await.expect("read greeting");
        drop(client);
        task.await.expect("handler task");

        assert!(registry.is_empty().await);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn orderly_session_produces_connect_payload_disconnect() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (registry, queue, task) = spawn_handler(server_side).await;

        let _greeting = read_frame(&mut client).await.expect("read greeting");
        write_frame(&mut client, b"alice").await.expect("send name");
        write_frame(&mut client, b"hello").await.expect("send payload");
        drop(client);
        task.await.expect("handler task");

        assert!(registry.is_empty().await);

        let batch = queue.drain().await;
        assert_eq!(batch.len(), 3);

        assert_eq!(batch[0].sender, SYSTEM_SENDER);
        assert_eq!(batch[0].payload_text(), "alice connected");

        assert_eq!(batch[1].sender, "alice");
        assert_eq!(batch[1].payload_text(), "hello");

        assert_eq!(batch[2].sender, SYSTEM_SENDER);
        assert_eq!(batch[2].payload_text(), "alice disconnected.");
    }

    #[tokio::test]
    async fn transport_error_skips_the_disconnect_notice() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (registry, queue, task) = spawn_handler(server_side).await;

        let _greeting = read_frame(&mut client).await.expect("read greeting");
        write_frame(&mut client, b"bob").await.expect("send name");
        // A frame that promises nine bytes and delivers one.
        client
            .write_all(&[0, 0, 0, 9, b'x'])
            .await
            .expect("send partial frame");
        drop(client);
        task.await.expect("handler task");

        assert!(registry.is_empty().await);

        let batch = queue.drain().await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload_text(), "bob connected");
    }

    #[tokio::test]
    async fn long_names_are_bounded_before_use() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (_registry, queue, task) = spawn_handler(server_side).await;

        let long = "x".repeat(MAX_NAME_LEN + 10);
        let _greeting = read_frame(&mut client).await.expect("read greeting");
        write_frame(&mut client, long.as_bytes()).await.expect("send name");
        write_frame(&mut client, b"hi").await.expect("send payload");
        drop(client);
        task.await.expect("handler task");

        let expected = "x".repeat(MAX_NAME_LEN);
        let batch = queue.drain().await;
        assert_eq!(batch[0].payload_text(), format!("{} connected", expected));
        assert_eq!(batch[1].sender, expected);
    }

    #[tokio::test]
    async fn empty_frames_relay_as_empty_messages() {
        let (server_side, mut client) = tokio::io::duplex(1024);
        let (_registry, queue, task) = spawn_handler(server_side).await;

        let _greeting = read_frame(&mut client).await.expect("read greeting");
        write_frame(&mut client, b"carol").await.expect("send name");
        write_frame(&mut client, b"").await.expect("send empty payload");
        drop(client);
        task.await.expect("handler task");

        let batch = queue.drain().await;
        assert_eq!(batch[1].sender, "carol");
        assert!(batch[1].payload.is_empty());
        assert_eq!(batch[1].display_text(), "[carol]: ");
    }
}
