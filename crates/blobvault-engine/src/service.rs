//! Hosting call surface
//!
//! `FileHosting` is the contract consumed by transports (HTTP/gRPC route
//! handlers, out of scope here). Both the lifecycle engine and the
//! cache-aside decorator implement it, so callers pick caching by
//! construction, not by code path.

use async_trait::async_trait;
use blobvault_common::{File, FileMetadata, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// Caller-supplied metadata hints for an upload
#[derive(Clone, Debug, Default)]
pub struct UploadMeta {
    /// Display name; on the generated-name path this is kept in the
    /// metadata record while the store name is generated
    pub name: Option<String>,
    /// MIME type; sniffed from content bytes when absent
    pub mime_type: Option<String>,
    /// Arbitrary key/value tags carried on the sidecar
    pub tags: HashMap<String, Vec<String>>,
}

/// File hosting operations
#[async_trait]
pub trait FileHosting: Send + Sync {
    /// Store `content` under `name`, versioning any previous generation
    ///
    /// Returns the name the content is served under and the stored file.
    /// Uploading identical bytes to an occupied name is an idempotent
    /// no-op.
    async fn upload_file(
        &self,
        name: &str,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)>;

    /// Store `content` under a generated collision-free name
    ///
    /// The TTL is always finite on this path; an infinite spec falls back
    /// to the default duration.
    async fn upload_file_with_generated_name(
        &self,
        content: Bytes,
        meta: UploadMeta,
        ttl_spec: &str,
    ) -> Result<(String, File)>;

    /// Fetch content and metadata for `name`
    async fn get_file(&self, name: &str) -> Result<File>;

    /// Fetch only the metadata sidecar for `name`
    async fn get_file_metadata(&self, name: &str) -> Result<FileMetadata>;

    /// List metadata for every stored file
    ///
    /// A missing sidecar for any listed name fails the whole call; there
    /// are no partial results.
    async fn get_files(&self) -> Result<Vec<FileMetadata>>;

    /// Move a file and its sidecar to a new name, keeping hash and TTL
    async fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Delete a file and its sidecar immediately, bypassing the queue
    async fn delete_file(&self, name: &str) -> Result<()>;
}
