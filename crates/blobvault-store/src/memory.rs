//! In-memory adapter
//!
//! Reference implementation of the byte store contract over a concurrent
//! map. Used by tests and embedded setups; semantics match the disk
//! adapter exactly, including the no-silent-overwrite rule.

use crate::store::ByteStore;
use async_trait::async_trait;
use blobvault_common::{Error, Result, METADATA_SUFFIX};
use bytes::Bytes;
use dashmap::DashMap;

struct StoredObject {
    data: Bytes,
    #[allow(dead_code)]
    content_type: String,
}

/// Byte store backed by an in-process concurrent map
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ByteStore for MemoryStore {
    async fn exists(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        self.objects
            .get(name)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| Error::not_found(format!("file {name} not found")))
    }

    async fn write(&self, name: &str, data: Bytes, content_type: &str) -> Result<()> {
        // Entry API keeps check-and-insert atomic on the shard
        match self.objects.entry(name.to_string()) {
            dashmap::Entry::Occupied(_) => {
                Err(Error::conflict(format!("file {name} already exists")))
            }
            dashmap::Entry::Vacant(slot) => {
                slot.insert(StoredObject {
                    data,
                    content_type: content_type.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<()> {
        let Some((_, object)) = self.objects.remove(name) else {
            return Err(Error::not_found(format!("file {name} not found")));
        };
        self.objects.insert(new_name.to_string(), object);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("file {name} not found")))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .objects
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|name| !name.ends_with(METADATA_SUFFIX))
            .collect();
        names.sort();
        Ok(names)
    }
}
