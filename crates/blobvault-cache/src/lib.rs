//! BlobVault Cache - Key/value cache contract
//!
//! This crate defines the `Cache` trait the cache-aside decorator probes,
//! plus `MemoryCache`, an in-process implementation with per-key TTL and
//! lazy expiry. A Redis-backed implementation would implement the same
//! trait.

pub mod memory;
mod cache;

pub use cache::Cache;
pub use memory::MemoryCache;
