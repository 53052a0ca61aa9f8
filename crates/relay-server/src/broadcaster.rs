//! The broadcast loop: sole consumer of the message queue.
//!
//! Batches are drained in FIFO order; each message is formatted once,
//! framed once, and written to every client in a registry snapshot taken
//! at that moment. Send failures are per-recipient: logged, skipped, and
//! never grounds for deregistering the client. The client's own handler
//! notices the dead connection on its read side and cleans up there.

use std::io;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use relay_core::{ClientRegistry, ConnectedClient, Message, MessageQueue};
use relay_protocol::{encode_frame, write_full};

/// Run the broadcast loop forever.
pub async fn run(queue: Arc<MessageQueue>, registry: Arc<ClientRegistry>) {
    loop {
        let batch = queue.drain().await;
        for message in batch {
            broadcast(&message, &registry).await;
        }
    }
}

/// Fan one message out to every currently registered client.
async fn broadcast(message: &Message, registry: &ClientRegistry) {
    let line = message.display_text();
    info!(sender = %message.sender, sent_at = %message.timestamp, "{}", line);

    let frame = encode_frame(line.as_bytes());
    let clients = registry.snapshot().await;
    debug!(recipients = clients.len(), "broadcasting");

    for client in &clients {
        if let Err(e) = send_to(client, &frame).await {
            warn!(
                client = client.id.0,
                name = %client.name,
                peer = %client.addr,
                error = %e,
                "send failed, skipping recipient"
            );
        }
    }
}

/// One delivery attempt; all-or-nothing for this recipient.
async fn send_to(client: &ConnectedClient, frame: &[u8]) -> io::Result<()> {
    let mut writer = client.writer.lock().await;
    write_full(&mut *writer, frame).await?;
    writer.flush().await
}

// ============================================================
//  Tests
// ============================================================
