//! BlobVault Store - Byte store contract and reference adapters
//!
//! This crate defines the `ByteStore` trait the lifecycle engine runs
//! against, plus two reference adapters:
//! - `DiskStore`: one flat directory on the local filesystem
//! - `MemoryStore`: in-process map, used by tests and embedded setups
//!
//! An object-storage adapter would implement the same trait over an S3
//! client; the engine never sees the difference.

pub mod disk;
pub mod memory;
mod store;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use store::ByteStore;
