//! BlobVault Common - Shared types and utilities
//!
//! This crate provides the domain types, error definitions, content hashing
//! and configuration structures used across all BlobVault components.

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
