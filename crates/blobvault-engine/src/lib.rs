//! BlobVault Engine - File lifecycle core
//!
//! This crate implements the file-lifecycle engine:
//! - Deduplicated, versioned uploads with TTL computation
//! - Deletion-job scheduling on a message queue
//! - The deletion consumer (at-least-once, re-validating)
//! - A cache-aside decorator over the hosting surface
//!
//! The engine coordinates a byte store, a queue and a cache through their
//! SPI traits; it holds no state of its own beyond configuration.

pub mod cached;
pub mod engine;
pub mod mime;
pub mod reaper;
mod service;
pub mod ttl;

pub use cached::CachedHosting;
pub use engine::HostingEngine;
pub use reaper::{decide, ReapAction, Reaper};
pub use service::{FileHosting, UploadMeta};
pub use ttl::{TtlSpec, TtlTable};
