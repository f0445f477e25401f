//! Content hashing for BlobVault
//!
//! The content hash recorded in a metadata sidecar is always the SHA-1 of
//! the bytes actually stored under the name at that point in time; it is
//! computed at write time and never recomputed lazily.

use sha1::{Digest, Sha1};

/// Compute the lowercase hex SHA-1 of `data`
#[must_use]
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
