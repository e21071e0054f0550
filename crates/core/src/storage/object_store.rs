use crate::error::RemoteStoreError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Blocking bucket/key object storage.
pub trait ObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError>;

    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteStoreError>;
}

/// Stores each bucket as a directory under `root`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, RemoteStoreError> {
        let invalid = bucket.is_empty()
            || bucket.contains(['/', '\\'])
            || key.is_empty()
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
        if invalid {
            return Err(request_error(bucket, key, "invalid bucket or key"));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        let path = self.object_path(bucket, key)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RemoteStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => request_error(bucket, key, e),
        })
    }

    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteStoreError> {
        let path = self.object_path(bucket, key)?;
        replace_file(&path, |file| file.write_all(body))
            .map_err(|e| request_error(bucket, key, e))
    }
}

/// Writes a sibling temp file and renames it over `path`, so readers see
/// either the previous object or the complete new one.
fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "object path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| request_error(bucket, key, "store lock poisoned"))?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| RemoteStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteStoreError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| request_error(bucket, key, "store lock poisoned"))?;
        objects.insert((bucket.to_string(), key.to_string()), body.to_vec());
        Ok(())
    }
}

fn request_error(bucket: &str, key: &str, reason: impl std::fmt::Display) -> RemoteStoreError {
    RemoteStoreError::Request {
        bucket: bucket.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
