//! BlobVault Queue - Durable at-least-once delivery contract
//!
//! This crate defines the `Queue` trait the deletion pipeline publishes to
//! and consumes from, plus `MemoryQueue`, an in-process broker with manual
//! ack/requeue and redelivery. A broker-backed implementation (AMQP or
//! similar) would implement the same trait.

pub mod memory;
mod queue;

pub use memory::MemoryQueue;
pub use queue::{Acker, Delivery, Queue};
