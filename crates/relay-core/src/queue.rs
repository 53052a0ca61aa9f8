//! Ordered hand-off between connection handlers and the broadcaster.
//!
//! Every connection handler is a producer; the broadcaster is the sole
//! consumer. The queue serialises pushes from all producers into one
//! global FIFO, and that order is the delivery-order contract: messages
//! are broadcast exactly in the order they were enqueued.

use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use crate::message::Message;

/// Unbounded FIFO of messages awaiting broadcast.
///
/// One lock guards the deque; [`Notify`] supplies the producer-to-consumer
/// wakeup. There is no depth bound, so producers can outrun the consumer
/// without ever blocking on capacity.
#[derive(Debug, Default)]
pub struct MessageQueue {
    inner: Mutex<VecDeque<Message>>,
    ready: Notify,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and wake the consumer if it is waiting.
    ///
    /// Safe from any number of concurrent producers; their relative order
    /// is whatever order the queue lock admits them in.
    pub async fn push(&self, message: Message) {
        self.inner.lock().await.push_back(message);
        self.ready.notify_one();
    }

    /// Remove and return every queued message, in push order.
    ///
    /// Waits while the queue is empty; the returned batch is never empty.
    /// Intended for a single consumer: the whole-batch hand-off means each
    /// message is seen by exactly one `drain` call.
    pub async fn drain(&self) -> Vec<Message> {
        loop {
            {
                let mut queue = self.inner.lock().await;
                if !queue.is_empty() {
                    return queue.drain(..).collect();
                }
            }
            // A push between the check above and this await leaves a stored
            // permit, so the wakeup cannot be lost.
            self.ready.notified().await;
        }
    }

    /// Number of messages currently queued.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True when nothing is waiting to be broadcast.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

// ============================================================
//  Tests
// ============================================================
