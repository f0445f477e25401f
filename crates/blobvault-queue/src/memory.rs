//! In-memory queue implementation
//!
//! An in-process broker with the same observable semantics the deletion
//! pipeline relies on from a real one: durable-for-the-process queues,
//! manual ack, nack with requeue, and at-least-once redelivery. Requeued
//! messages become visible again after a short redelivery delay so an
//! immature job does not spin the consumer.

use crate::queue::{Acker, Delivery, Queue};
use async_trait::async_trait;
use blobvault_common::{Error, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct Message {
    payload: Bytes,
    delivery_count: u32,
}

/// Requeued message waiting out its redelivery delay
///
/// Reverse ordering so `BinaryHeap` acts as a min-heap (earliest first).
struct Scheduled {
    due: Instant,
    message: Message,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.due.cmp(&self.due)
    }
}

#[derive(Default)]
struct Inner {
    ready: VecDeque<Message>,
    scheduled: BinaryHeap<Scheduled>,
}

impl Inner {
    /// Move scheduled messages whose delay has elapsed into the ready queue
    fn promote_due(&mut self, now: Instant) {
        while let Some(entry) = self.scheduled.peek() {
            if entry.due > now {
                break;
            }
            if let Some(entry) = self.scheduled.pop() {
                self.ready.push_back(entry.message);
            }
        }
    }

    fn next_due(&self) -> Option<Instant> {
        self.scheduled.peek().map(|entry| entry.due)
    }
}

struct QueueState {
    inner: Mutex<Inner>,
    notify: Notify,
    redelivery_delay: Duration,
}

impl QueueState {
    fn publish(&self, message: Message) {
        self.inner.lock().ready.push_back(message);
        self.notify.notify_one();
    }

    fn schedule(&self, message: Message) {
        self.inner.lock().scheduled.push(Scheduled {
            due: Instant::now() + self.redelivery_delay,
            message,
        });
        self.notify.notify_one();
    }

    /// Put an unsettled message straight back at the head of the queue
    fn requeue_front(&self, message: Message) {
        self.inner.lock().ready.push_front(message);
        self.notify.notify_one();
    }
}

/// In-process broker implementing the queue contract
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, Arc<QueueState>>>,
    redelivery_delay: Duration,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    /// Create a broker with the default redelivery delay
    #[must_use]
    pub fn new() -> Self {
        Self::with_redelivery_delay(DEFAULT_REDELIVERY_DELAY)
    }

    /// Create a broker with a custom redelivery delay
    #[must_use]
    pub fn with_redelivery_delay(redelivery_delay: Duration) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            redelivery_delay,
        }
    }

    fn state(&self, queue: &str) -> Result<Arc<QueueState>> {
        self.queues
            .lock()
            .get(queue)
            .cloned()
            .ok_or_else(|| Error::queue(format!("queue {queue} not declared")))
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.queues
            .lock()
            .entry(queue.to_string())
            .or_insert_with(|| {
                Arc::new(QueueState {
                    inner: Mutex::new(Inner::default()),
                    notify: Notify::new(),
                    redelivery_delay: self.redelivery_delay,
                })
            });
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: Bytes) -> Result<()> {
        let state = self.state(queue)?;
        state.publish(Message {
            payload,
            delivery_count: 0,
        });
        Ok(())
    }

    async fn receive(&self, queue: &str, timeout: Duration) -> Result<Option<Delivery>> {
        let state = self.state(queue)?;
        let deadline = Instant::now() + timeout;

        loop {
            let wait_until = {
                let mut inner = state.inner.lock();
                inner.promote_due(Instant::now());
                if let Some(message) = inner.ready.pop_front() {
                    let redelivered = message.delivery_count > 0;
                    let payload = message.payload.clone();
                    let acker = Box::new(MemoryAcker {
                        state: Arc::clone(&state),
                        message: Some(message),
                    });
                    return Ok(Some(Delivery::new(payload, redelivered, acker)));
                }
                inner.next_due().map_or(deadline, |due| due.min(deadline))
            };

            if Instant::now() >= deadline {
                return Ok(None);
            }

            tokio::select! {
                () = state.notify.notified() => {}
                () = tokio::time::sleep_until(wait_until) => {
                    if wait_until >= deadline {
                        return Ok(None);
                    }
                }
            }
        }
    }
}

struct MemoryAcker {
    state: Arc<QueueState>,
    message: Option<Message>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(mut self: Box<Self>) -> Result<()> {
        self.message = None;
        Ok(())
    }

    async fn nack(mut self: Box<Self>, requeue: bool) -> Result<()> {
        if let Some(mut message) = self.message.take() {
            if requeue {
                message.delivery_count += 1;
                self.state.schedule(message);
            }
        }
        Ok(())
    }
}

impl Drop for MemoryAcker {
    fn drop(&mut self) {
        // An unsettled delivery (consumer crash or shutdown mid-handling)
        // goes back to the head of the queue, never to the floor.
        if let Some(mut message) = self.message.take() {
            message.delivery_count += 1;
            self.state.requeue_front(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_publish_receive_ack() {
        let queue = MemoryQueue::new();
        queue.declare("q").await.unwrap();
        queue.publish("q", Bytes::from_static(b"job")).await.unwrap();

        let delivery = queue.receive("q", SHORT).await.unwrap().unwrap();
        assert_eq!(delivery.payload().as_ref(), b"job");
        assert!(!delivery.redelivered());
        delivery.ack().await.unwrap();

        assert!(queue.receive("q", SHORT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undeclared_queue_errors() {
        let queue = MemoryQueue::new();
        assert!(queue.publish("q", Bytes::from_static(b"job")).await.is_err());
        assert!(queue.receive("q", SHORT).await.is_err());
    }

    #[tokio::test]
    async fn test_nack_requeue_redelivers() {
        let queue = MemoryQueue::with_redelivery_delay(Duration::from_millis(10));
        queue.declare("q").await.unwrap();
        queue.publish("q", Bytes::from_static(b"job")).await.unwrap();

        let delivery = queue.receive("q", SHORT).await.unwrap().unwrap();
        delivery.nack(true).await.unwrap();

        let delivery = queue
            .receive("q", Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert!(delivery.redelivered());
        delivery.ack().await.unwrap();
    }

    #[tokio::test]
    async fn test_nack_without_requeue_discards() {
        let queue = MemoryQueue::with_redelivery_delay(Duration::from_millis(1));
        queue.declare("q").await.unwrap();
        queue.publish("q", Bytes::from_static(b"job")).await.unwrap();

        let delivery = queue.receive("q", SHORT).await.unwrap().unwrap();
        delivery.nack(false).await.unwrap();

        assert!(queue.receive("q", SHORT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_delivery_is_requeued() {
        let queue = MemoryQueue::new();
        queue.declare("q").await.unwrap();
        queue.publish("q", Bytes::from_static(b"job")).await.unwrap();

        let delivery = queue.receive("q", SHORT).await.unwrap().unwrap();
        drop(delivery);

        let delivery = queue.receive("q", SHORT).await.unwrap().unwrap();
        assert!(delivery.redelivered());
        delivery.ack().await.unwrap();
    }

    #[tokio::test]
    async fn test_receive_timeout_on_empty_queue() {
        let queue = MemoryQueue::new();
        queue.declare("q").await.unwrap();
        let started = Instant::now();
        assert!(queue.receive("q", SHORT).await.unwrap().is_none());
        assert!(started.elapsed() >= SHORT);
    }

    #[tokio::test]
    async fn test_fifo_within_queue() {
        let queue = MemoryQueue::new();
        queue.declare("q").await.unwrap();
        queue.publish("q", Bytes::from_static(b"one")).await.unwrap();
        queue.publish("q", Bytes::from_static(b"two")).await.unwrap();

        let first = queue.receive("q", SHORT).await.unwrap().unwrap();
        assert_eq!(first.payload().as_ref(), b"one");
        first.ack().await.unwrap();

        let second = queue.receive("q", SHORT).await.unwrap().unwrap();
        assert_eq!(second.payload().as_ref(), b"two");
        second.ack().await.unwrap();
    }
}
