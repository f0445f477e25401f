//! Message queue contract

use async_trait::async_trait;
use blobvault_common::Result;
use bytes::Bytes;
use std::time::Duration;

/// Durable publish/consume primitive with at-least-once delivery
///
/// Delivery ordering is not guaranteed across names. Consumers must be
/// idempotent: a message may be redelivered any number of times until it
/// is acknowledged.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Declare a queue, creating it if it does not exist
    async fn declare(&self, queue: &str) -> Result<()>;

    /// Publish a message to a declared queue
    async fn publish(&self, queue: &str, payload: Bytes) -> Result<()>;

    /// Receive the next message, waiting up to `timeout`
    ///
    /// Returns `None` when the timeout elapses with no message available.
    /// The returned delivery must be acknowledged or negatively
    /// acknowledged; dropping it unacknowledged requeues it.
    async fn receive(&self, queue: &str, timeout: Duration) -> Result<Option<Delivery>>;
}

/// Settlement handle for one delivered message
#[async_trait]
pub trait Acker: Send {
    /// Acknowledge the message, removing it from the queue
    async fn ack(self: Box<Self>) -> Result<()>;

    /// Reject the message, requeueing it for redelivery if requested
    async fn nack(self: Box<Self>, requeue: bool) -> Result<()>;
}

/// One delivered message
pub struct Delivery {
    payload: Bytes,
    redelivered: bool,
    acker: Box<dyn Acker>,
}

impl Delivery {
    /// Assemble a delivery from its payload and settlement handle
    #[must_use]
    pub fn new(payload: Bytes, redelivered: bool, acker: Box<dyn Acker>) -> Self {
        Self {
            payload,
            redelivered,
            acker,
        }
    }

    /// The message payload
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Whether this message was delivered before
    #[must_use]
    pub const fn redelivered(&self) -> bool {
        self.redelivered
    }

    /// Acknowledge the message
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }

    /// Negatively acknowledge the message
    pub async fn nack(self, requeue: bool) -> Result<()> {
        self.acker.nack(requeue).await
    }
}
