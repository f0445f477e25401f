//! Core type definitions for BlobVault
//!
//! This module defines the domain types shared by the lifecycle engine,
//! the deletion consumer and the cache-aside decorator: validated file
//! names, the expiry type, metadata sidecars and deletion jobs.

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Suffix under which a metadata sidecar is stored next to its content object
pub const METADATA_SUFFIX: &str = ".metadata";

/// Name of the metadata sidecar object for `name`
#[must_use]
pub fn sidecar_name(name: &str) -> String {
    format!("{name}{METADATA_SUFFIX}")
}

/// A file name valid within the store namespace
///
/// Names are flat: a path separator would escape the namespace, so it is
/// rejected at the boundary before any store call is made.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct FileName(String);

impl FileName {
    /// Create a new file name, validating it
    pub fn new(name: impl Into<String>) -> Result<Self, FileNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Create without validation (internal use only)
    #[must_use]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the file name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), FileNameError> {
        if name.is_empty() {
            return Err(FileNameError::Empty);
        }
        if name.contains('/') {
            return Err(FileNameError::PathSeparator);
        }
        Ok(())
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileName({:?})", self.0)
    }
}

/// Errors that can occur when creating a file name
#[derive(Debug, Clone, thiserror::Error)]
pub enum FileNameError {
    #[error("file name cannot be empty")]
    Empty,
    #[error("file name cannot contain '/'")]
    PathSeparator,
}

/// Expiry of a stored file
///
/// `Never` replaces the epoch-zero sentinel the wire format uses; on the
/// wire it is still encoded as the Unix epoch so existing sidecars remain
/// readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The file never expires
    Never,
    /// The file expires at the given instant
    At(DateTime<Utc>),
}

impl Expiry {
    /// Whether this expiry is infinite
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    /// Whether the expiry has passed as of `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => *at <= now,
        }
    }

    /// Time remaining until expiry, `None` if infinite
    ///
    /// Already-expired files yield a zero delta, never a negative one.
    #[must_use]
    pub fn time_until(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match self {
            Self::Never => None,
            Self::At(at) => Some((*at - now).max(TimeDelta::zero())),
        }
    }

    /// Wire representation: `Never` maps to the Unix epoch
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::Never => DateTime::UNIX_EPOCH,
            Self::At(at) => *at,
        }
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        if at == DateTime::UNIX_EPOCH {
            Self::Never
        } else {
            Self::At(at)
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_datetime().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DateTime::<Utc>::deserialize(deserializer).map(Self::from)
    }
}

/// Metadata sidecar of a stored file
///
/// Persisted as JSON at `<name>.metadata`. `id` is the store name of the
/// generation the record was written for; for a live generation it equals
/// `name`. `backup_name` points at the archived prior generation, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Absent in sidecars written before the field existed; defaults empty
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(rename = "sha1")]
    pub content_hash: String,
    #[serde(rename = "meta", default)]
    pub tags: HashMap<String, Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub expired_at: Expiry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_name: Option<String>,
}

impl FileMetadata {
    /// Deserialize a sidecar from its stored bytes
    pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Serialize the sidecar for storage
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A file as served to callers: content plus its metadata sidecar
///
/// Content is base64 in JSON so a `File` can be parked in the cache whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    #[serde(with = "base64_bytes")]
    pub content: Bytes,
    pub metadata: FileMetadata,
}

impl File {
    /// Deserialize a file from its cached bytes
    pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Serialize the file for caching
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

mod base64_bytes {
    use super::{Bytes, Deserialize, Deserializer, Serializer};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD
            .decode(raw)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

/// Intent record placed on the deletion queue at write time
///
/// The expected hash and expiry are captured as of schedule time; the
/// consumer cross-checks them against current metadata, never re-derives
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionJob {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "sha1")]
    pub content_hash: String,
    #[serde(rename = "expiredAt")]
    pub expired_at: DateTime<Utc>,
}

impl DeletionJob {
    /// Deserialize a job from its queued bytes
    pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Serialize the job for publishing
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_accepts_dots() {
        let name = FileName::new("a.txt").unwrap();
        assert_eq!(name.as_str(), "a.txt");
        assert!(FileName::new("a.txt.1700000000000000000").is_ok());
    }

    #[test]
    fn test_file_name_rejects_separator() {
        assert!(matches!(
            FileName::new("dir/a.txt"),
            Err(FileNameError::PathSeparator)
        ));
        assert!(matches!(FileName::new(""), Err(FileNameError::Empty)));
    }

    #[test]
    fn test_sidecar_name() {
        assert_eq!(sidecar_name("a.txt"), "a.txt.metadata");
    }

    #[test]
    fn test_expiry_never_is_epoch_on_wire() {
        let json = serde_json::to_string(&Expiry::Never).unwrap();
        let back: Expiry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Expiry::Never);
        assert!(json.contains("1970-01-01"));
    }

    #[test]
    fn test_expiry_finite_round_trip() {
        let at = Utc::now() + TimeDelta::minutes(5);
        let json = serde_json::to_string(&Expiry::At(at)).unwrap();
        let back: Expiry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Expiry::At(at));
    }

    #[test]
    fn test_expiry_is_expired() {
        let now = Utc::now();
        assert!(!Expiry::Never.is_expired(now));
        assert!(Expiry::At(now - TimeDelta::seconds(1)).is_expired(now));
        assert!(!Expiry::At(now + TimeDelta::seconds(1)).is_expired(now));
    }

    #[test]
    fn test_expiry_time_until_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(Expiry::Never.time_until(now), None);
        assert_eq!(
            Expiry::At(now - TimeDelta::minutes(1)).time_until(now),
            Some(TimeDelta::zero())
        );
        assert_eq!(
            Expiry::At(now + TimeDelta::minutes(5)).time_until(now),
            Some(TimeDelta::minutes(5))
        );
    }

    #[test]
    fn test_metadata_wire_field_names() {
        let metadata = FileMetadata {
            id: "a.txt".into(),
            name: "a.txt".into(),
            mime_type: "text/plain; charset=utf-8".into(),
            content_hash: "deadbeef".into(),
            tags: HashMap::new(),
            created_at: Utc::now(),
            expired_at: Expiry::Never,
            backup_name: None,
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"sha1\":\"deadbeef\""));
        assert!(json.contains("\"meta\":{}"));
        assert!(!json.contains("backup_name"));

        let back = FileMetadata::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_file_content_is_base64_in_json() {
        let file = File {
            content: Bytes::from_static(b"hello"),
            metadata: FileMetadata {
                id: "a.txt".into(),
                name: "a.txt".into(),
                mime_type: "text/plain; charset=utf-8".into(),
                content_hash: "deadbeef".into(),
                tags: HashMap::new(),
                created_at: Utc::now(),
                expired_at: Expiry::Never,
                backup_name: None,
            },
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("aGVsbG8="));
        assert_eq!(File::from_bytes(json.as_bytes()).unwrap(), file);
    }

    #[test]
    fn test_deletion_job_wire_field_names() {
        let job = DeletionJob {
            file_name: "a.txt".into(),
            content_hash: "deadbeef".into(),
            expired_at: Utc::now(),
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"fileName\""));
        assert!(json.contains("\"sha1\""));
        assert!(json.contains("\"expiredAt\""));
        assert_eq!(DeletionJob::from_bytes(json.as_bytes()).unwrap(), job);
    }
}
