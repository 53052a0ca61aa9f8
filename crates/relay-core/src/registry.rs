//! Concurrent registry of connected clients.
//!
//! One shared lock covers the whole collection. Handlers add themselves
//! once the name handshake completes and remove themselves exactly once on
//! exit; the broadcaster only ever takes snapshots, so the lock is never
//! held across network I/O.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::io::AsyncWrite;
use tokio::sync::{Mutex, RwLock};

/// Maximum display-name length in bytes. Longer names are silently
/// truncated, never rejected.
pub const MAX_NAME_LEN: usize = 32;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection, unique for the process lifetime.
///
/// Names are neither unique nor validated, so ids are the only safe key
/// for registration and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

impl ClientId {
    /// Issue the next process-unique id.
    pub fn next() -> Self {
        ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Write half of a client connection, shareable between the client's own
/// handler and broadcaster snapshots. The inner lock serialises writes so
/// frames from different sources cannot interleave on the wire.
pub type ClientWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Wrap a write half in the shared, lockable form the registry stores.
pub fn shared_writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> ClientWriter {
    Arc::new(Mutex::new(Box::new(writer)))
}

/// A registered client, as the broadcaster sees it.
#[derive(Clone)]
pub struct ConnectedClient {
    pub id: ClientId,
    /// Display name from the handshake; bounded, not unique.
    pub name: String,
    /// Peer address, for log output.
    pub addr: SocketAddr,
    /// Shared handle to the connection's write half.
    pub writer: ClientWriter,
}

impl fmt::Debug for ConnectedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedClient")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Set of currently connected clients, keyed by [`ClientId`].
///
/// Insertion order is preserved and reused for fan-out iteration, which
/// keeps delivery deterministic; it carries no other meaning.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<IndexMap<ClientId, ConnectedClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. Ids are issued once per connection, so a key
    /// collision cannot occur; if one did, the newer entry would win.
    pub async fn add(&self, client: ConnectedClient) {
        let mut clients = self.clients.write().await;
        clients.insert(client.id, client);
    }

    /// Deregister by id, keeping the order of the remaining clients.
    ///
    /// Removing an absent id is a no-op. Returns whether an entry existed,
    /// so callers can tell a real removal from a repeat.
    pub async fn remove(&self, id: ClientId) -> bool {
        let mut clients = self.clients.write().await;
        clients.shift_remove(&id).is_some()
    }

    /// Point-in-time copy of all clients, in registration order.
    ///
    /// Taken under the read lock and iterated without it, so sending to
    /// the snapshot never blocks registration or removal.
    pub async fn snapshot(&self) -> Vec<ConnectedClient> {
        let clients = self.clients.read().await;
        clients.values().cloned().collect()
    }

    /// Number of currently registered clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// True when no client is registered.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

/// Apply the display-name bound to raw handshake bytes.
///
/// Lossy UTF-8 with trailing NULs stripped, then truncated to at most
/// [`MAX_NAME_LEN`] bytes on a character boundary. Empty and duplicate
/// names are accepted as-is.
pub fn bounded_name(raw: &[u8]) -> String {
    let mut name = crate::message::text_lossy(raw);
    if name.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

// ============================================================
//  Tests
// ============================================================
