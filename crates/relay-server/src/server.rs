//! TCP listener and top-level wiring.
//!
//! `Server::bind` opens the listening socket and builds the shared state;
//! `run` spawns the broadcaster and accepts forever, one handler task per
//! connection. There is no cap on concurrent connections and no worker
//! pool: each accepted socket gets its own task for its whole lifetime.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};

use relay_core::{ClientId, ClientRegistry, MessageQueue};

use crate::broadcaster;
use crate::config::Config;
use crate::handler;

/// A bound relay server, ready to run.
pub struct Server {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    queue: Arc<MessageQueue>,
}

impl Server {
    /// Bind the listening socket and build the shared state.
    pub async fn bind(config: &Config) -> Result<Server> {
        let listener = TcpListener::bind(config.socket_addr_string()).await?;
        Ok(Server {
            listener,
            registry: Arc::new(ClientRegistry::new()),
            queue: Arc::new(MessageQueue::new()),
        })
    }

    /// Address the listener is actually bound to. Useful when the
    /// configured port was 0 and the OS picked one.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the shared client registry.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        self.registry.clone()
    }

    /// Accept and serve until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let addr = self.listener.local_addr()?;
        info!(%addr, "relay listening");

        tokio::spawn(broadcaster::run(self.queue.clone(), self.registry.clone()));

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let id = ClientId::next();
                    info!(client = id.0, peer = %peer, "connection accepted");

                    let registry = self.registry.clone();
                    let queue = self.queue.clone();
                    tokio::spawn(async move {
                        handler::run(id, stream, peer, registry, queue).await;
                    });
                }
                Err(e) => {
                    // One bad accept must not take the listener down.
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
