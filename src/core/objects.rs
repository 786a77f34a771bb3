//! Evidence object storage
//!
//! Blobs are addressed by `{cycle}/{test case}_{file name}` keys and handed
//! back as URLs the report fetcher can read.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::core::entity::CycleId;

/// Key of an uploaded evidence object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build the key for an evidence image of a test case
    ///
    /// Path separators inside the parts are replaced so the key always has
    /// exactly two segments.
    pub fn evidence(cycle: CycleId, test_case_id: &str, file_name: &str) -> Self {
        let clean = |s: &str| s.replace(['/', '\\'], "_");
        Self(format!(
            "{}/{}_{}",
            cycle,
            clean(test_case_id),
            clean(file_name)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised by an object store
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ObjectStoreError {
    #[error("object already exists: {key}")]
    #[diagnostic(code(qag::objects::exists), help("upload with upsert to overwrite it"))]
    AlreadyExists { key: String },

    #[error("failed to write object {path:?}")]
    #[diagnostic(code(qag::objects::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot express {path:?} as a URL")]
    #[diagnostic(code(qag::objects::url))]
    NotAddressable { path: PathBuf },
}

/// Blob storage for evidence images
pub trait ObjectStore {
    /// Store `bytes` under `key` and return a URL that resolves to them
    ///
    /// With `upsert = false` an existing key is an error.
    fn upload(&self, key: &ObjectKey, bytes: &[u8], upsert: bool) -> Result<Url, ObjectStoreError>;
}

/// Object store backed by a local directory, addressed with `file://` URLs
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of a key
    pub fn path_of(&self, key: &ObjectKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl ObjectStore for LocalObjectStore {
    fn upload(&self, key: &ObjectKey, bytes: &[u8], upsert: bool) -> Result<Url, ObjectStoreError> {
        let path = self.path_of(key);
        if !upsert && path.exists() {
            return Err(ObjectStoreError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let io_err = |source| ObjectStoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&path, bytes).map_err(io_err)?;

        let absolute = path.canonicalize().map_err(io_err)?;
        let url = Url::from_file_path(&absolute)
            .map_err(|_| ObjectStoreError::NotAddressable { path: absolute.clone() })?;

        tracing::info!(%key, bytes = bytes.len(), "object uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_evidence_key_format() {
        let key = ObjectKey::evidence(CycleId(12), "CT-003", "login.png");
        assert_eq!(key.as_str(), "12/CT-003_login.png");

        let key = ObjectKey::evidence(CycleId(1), "CT-001", "../up/shot.png");
        assert_eq!(key.as_str(), "1/CT-001_.._up_shot.png");
    }

    #[test]
    fn test_upload_returns_readable_file_url() {
        let tmp = tempdir().unwrap();
        let store = LocalObjectStore::new(tmp.path());
        let key = ObjectKey::evidence(CycleId(1), "CT-001", "a.png");

        let url = store.upload(&key, b"png bytes", false).unwrap();
        assert_eq!(url.scheme(), "file");
        let path = url.to_file_path().unwrap();
        assert_eq!(fs::read(path).unwrap(), b"png bytes");
        assert!(store.path_of(&key).ends_with("1/CT-001_a.png"));
    }

    #[test]
    fn test_upsert_overwrites() {
        let tmp = tempdir().unwrap();
        let store = LocalObjectStore::new(tmp.path());
        let key = ObjectKey::evidence(CycleId(1), "CT-001", "a.png");

        store.upload(&key, b"first", true).unwrap();
        store.upload(&key, b"second", true).unwrap();
        assert_eq!(fs::read(store.path_of(&key)).unwrap(), b"second");
    }

    #[test]
    fn test_existing_key_without_upsert_fails() {
        let tmp = tempdir().unwrap();
        let store = LocalObjectStore::new(tmp.path());
        let key = ObjectKey::evidence(CycleId(1), "CT-001", "a.png");

        store.upload(&key, b"first", false).unwrap();
        let err = store.upload(&key, b"second", false).unwrap_err();
        assert!(matches!(err, ObjectStoreError::AlreadyExists { .. }));
        assert_eq!(fs::read(store.path_of(&key)).unwrap(), b"first");
    }
}
