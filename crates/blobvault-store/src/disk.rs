//! Local filesystem adapter
//!
//! Stores every object as a file in one flat directory. Names are
//! validated upstream to contain no path separator, so a simple join
//! cannot escape the root.

use crate::store::ByteStore;
use async_trait::async_trait;
use blobvault_common::{Error, Result, METADATA_SUFFIX};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::error;

/// Byte store backed by a single directory on the local filesystem
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open a disk store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl ByteStore for DiskStore {
    async fn exists(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.path(name)).await.unwrap_or(false)
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        if !self.exists(name).await {
            return Err(Error::not_found(format!("file {name} not found")));
        }
        match tokio::fs::read(self.path(name)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) => {
                error!(file = name, error = %err, "fail read file");
                Err(Error::store(format!("fail read file {name}")))
            }
        }
    }

    async fn write(&self, name: &str, data: Bytes, _content_type: &str) -> Result<()> {
        if self.exists(name).await {
            return Err(Error::conflict(format!("file {name} already exists")));
        }
        if let Err(err) = tokio::fs::write(self.path(name), &data).await {
            error!(file = name, error = %err, "fail write file");
            return Err(Error::store(format!("fail write file {name}")));
        }
        Ok(())
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<()> {
        if !self.exists(name).await {
            return Err(Error::not_found(format!("file {name} not found")));
        }
        if let Err(err) = tokio::fs::rename(self.path(name), self.path(new_name)).await {
            error!(file = name, to = new_name, error = %err, "fail move file");
            return Err(Error::store(format!("fail move file {name} to {new_name}")));
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name).await {
            return Err(Error::not_found(format!("file {name} not found")));
        }
        if let Err(err) = tokio::fs::remove_file(self.path(name)).await {
            error!(file = name, error = %err, "fail delete file");
            return Err(Error::store(format!("fail delete file {name}")));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|err| Error::store(format!("fail list files: {err}")))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| Error::store(format!("fail list files: {err}")))?
        {
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(METADATA_SUFFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}
