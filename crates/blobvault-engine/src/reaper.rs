//! Deletion consumer
//!
//! Consumes deletion jobs from the queue and deletes expired generations
//! from the byte store. Delivery is at-least-once, so every step is
//! idempotent: a job whose file is already gone, or whose content was
//! replaced since the job was published, is dropped without effect.
//!
//! The job's hash and expiry are never trusted on their own. The current
//! metadata sidecar is re-read on every delivery and the decision is made
//! against it, so a stale job can never delete a newer generation.

use blobvault_common::{sidecar_name, DeletionJob, Expiry, FileMetadata, Result};
use blobvault_queue::{Delivery, Queue};
use blobvault_store::ByteStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What to do with one delivered deletion job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReapAction {
    /// The file is expired and still the generation the job was published
    /// for: delete it
    Delete,
    /// The job no longer applies (file gone, content replaced, or expiry
    /// changed): acknowledge without deleting
    Drop,
    /// The job is not yet due: redeliver later
    Requeue,
}

/// Decide the fate of a deletion job against the current metadata
///
/// `metadata` is `None` when the sidecar no longer exists. The decision is
/// a pure function of the job, the metadata and the clock. A job that has
/// not matured requeues unconditionally, before the metadata is even
/// consulted.
#[must_use]
pub fn decide(job: &DeletionJob, metadata: Option<&FileMetadata>, now: DateTime<Utc>) -> ReapAction {
    if now < job.expired_at {
        return ReapAction::Requeue;
    }
    let Some(metadata) = metadata else {
        return ReapAction::Drop;
    };
    if metadata.content_hash != job.content_hash {
        // The name was re-used for different content; that generation has
        // its own job.
        return ReapAction::Drop;
    }
    match metadata.expired_at {
        Expiry::Never => ReapAction::Drop,
        // Not expected by construction, but a later write could have
        // pushed the expiry out under the same generation.
        Expiry::At(at) if at > now => ReapAction::Requeue,
        Expiry::At(_) => ReapAction::Delete,
    }
}

/// The deletion consumer loop
pub struct Reaper {
    store: Arc<dyn ByteStore>,
    queue: Arc<dyn Queue>,
    deletion_queue: String,
    poll_timeout: Duration,
}

impl Reaper {
    /// Create a consumer for `deletion_queue`
    #[must_use]
    pub fn new(store: Arc<dyn ByteStore>, queue: Arc<dyn Queue>, deletion_queue: &str) -> Self {
        Self {
            store,
            queue,
            deletion_queue: deletion_queue.to_string(),
            poll_timeout: Duration::from_secs(1),
        }
    }

    /// Consume jobs until `shutdown` flips to true
    ///
    /// A delivery in flight when shutdown arrives is still settled before
    /// the loop exits; unsettled deliveries would be requeued by the queue
    /// anyway, this just avoids the redelivery delay.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue = self.deletion_queue.as_str(), "deletion consumer started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => {}
                received = self.queue.receive(&self.deletion_queue, self.poll_timeout) => {
                    match received {
                        Ok(Some(delivery)) => self.handle(delivery).await,
                        Ok(None) => {}
                        Err(err) => {
                            error!(error = %err, "fail receive deletion job");
                            tokio::time::sleep(self.poll_timeout).await;
                        }
                    }
                }
            }
        }
        info!(queue = self.deletion_queue.as_str(), "deletion consumer stopped");
    }

    /// Settle one delivery
    async fn handle(&self, delivery: Delivery) {
        let job = match DeletionJob::from_bytes(delivery.payload()) {
            Ok(job) => job,
            Err(err) => {
                // A payload that never parses would redeliver forever.
                warn!(error = %err, "drop malformed deletion job");
                self.settle(delivery, ReapAction::Drop).await;
                return;
            }
        };

        if Utc::now() < job.expired_at {
            // Not yet due; skip the sidecar fetch entirely.
            debug!(file = job.file_name.as_str(), "deletion job not yet due");
            self.settle(delivery, ReapAction::Requeue).await;
            return;
        }

        let metadata = match self.store.read(&sidecar_name(&job.file_name)).await {
            Ok(data) => match FileMetadata::from_bytes(&data) {
                Ok(metadata) => Some(metadata),
                Err(err) => {
                    warn!(file = job.file_name.as_str(), error = %err, "drop job for unreadable sidecar");
                    self.settle(delivery, ReapAction::Drop).await;
                    return;
                }
            },
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                warn!(file = job.file_name.as_str(), error = %err, "fail read sidecar, requeueing job");
                self.settle(delivery, ReapAction::Requeue).await;
                return;
            }
        };

        let action = decide(&job, metadata.as_ref(), Utc::now());
        match action {
            ReapAction::Delete => {
                if let Err(err) = self.delete(&job.file_name).await {
                    error!(file = job.file_name.as_str(), error = %err, "fail delete expired file");
                    self.settle(delivery, ReapAction::Requeue).await;
                    return;
                }
                info!(file = job.file_name.as_str(), "deleted expired file");
            }
            ReapAction::Drop => {
                debug!(file = job.file_name.as_str(), "dropped stale deletion job");
            }
            ReapAction::Requeue => {
                debug!(file = job.file_name.as_str(), "deletion job not yet due");
            }
        }
        self.settle(delivery, action).await;
    }

    /// Delete both objects, tolerating ones already gone
    ///
    /// The sidecar delete is log-only: the content is the object that must
    /// not outlive its expiry, and a leftover sidecar is dropped by the
    /// next job cycle or listing repair.
    async fn delete(&self, name: &str) -> Result<()> {
        match self.store.delete(name).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
        match self.store.delete(&sidecar_name(name)).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                warn!(file = name, error = %err, "fail delete metadata sidecar");
            }
        }
        Ok(())
    }

    async fn settle(&self, delivery: Delivery, action: ReapAction) {
        let settled = match action {
            ReapAction::Requeue => delivery.nack(true).await,
            ReapAction::Delete | ReapAction::Drop => delivery.ack().await,
        };
        if let Err(err) = settled {
            error!(error = %err, "fail settle deletion job delivery");
        }
    }
}
