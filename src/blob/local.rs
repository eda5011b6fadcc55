//! # Local Filesystem Blob Store
//!
//! Maps blob keys onto paths under a root directory, with `/` in a key
//! becoming a subdirectory. Uploads write to a temp file and rename into
//! place so a blob is never visible half-written under its final key.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::errors::{BlobError, BlobResult};
use super::{BlobMetadata, BlobStore, UploadReceipt};

/// Blob store rooted at a local directory.
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn full_path(&self, key: &str) -> BlobResult<PathBuf> {
        if key.is_empty() || key.split('/').any(|part| part == "..") {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    fn created_at(meta: &fs::Metadata) -> DateTime<Utc> {
        let time = meta
            .created()
            .or_else(|_| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        DateTime::<Utc>::from(time)
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(&self, key: &str, bytes: &[u8]) -> BlobResult<UploadReceipt> {
        let path = self.full_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }

        // Write to a temp sibling, then rename. Rename is atomic within a
        // directory, so readers see either the old blob or the new one.
        let tmp = path.with_extension("tmp-upload");
        fs::write(&tmp, bytes).map_err(|e| BlobError::Io(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| BlobError::Io(e.to_string()))?;

        Ok(UploadReceipt {
            size: bytes.len() as u64,
            download_url: self.download_url(key)?,
            created: Utc::now(),
        })
    }

    fn download(&self, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.full_path(key)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::NotFound(key.to_string())
            } else {
                BlobError::Io(e.to_string())
            }
        })
    }

    fn list_keys(&self, prefix: &str) -> BlobResult<Vec<String>> {
        // Split the prefix into a directory part and a filename prefix.
        let (dir_part, name_prefix) = match prefix.rfind('/') {
            Some(idx) => (&prefix[..idx + 1], &prefix[idx + 1..]),
            None => ("", prefix),
        };

        let dir = if dir_part.is_empty() {
            self.root.clone()
        } else {
            self.root.join(dir_part.trim_end_matches('/'))
        };

        let mut keys = Vec::new();
        if dir.is_dir() {
            let entries = fs::read_dir(&dir).map_err(|e| BlobError::ListFailed {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| BlobError::ListFailed {
                    prefix: prefix.to_string(),
                    reason: e.to_string(),
                })?;
                if !entry.path().is_file() {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    if name.starts_with(name_prefix) {
                        keys.push(format!("{dir_part}{name}"));
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn get_metadata(&self, key: &str) -> BlobResult<BlobMetadata> {
        let path = self.full_path(key)?;
        let meta = fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::NotFound(key.to_string())
            } else {
                BlobError::Io(e.to_string())
            }
        })?;

        Ok(BlobMetadata {
            size: meta.len(),
            created: Self::created_at(&meta),
        })
    }

    fn download_url(&self, key: &str) -> BlobResult<String> {
        let path = self.full_path(key)?;
        Ok(format!("file://{}", path.display()))
    }

    fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.full_path(key)?;
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::NotFound(key.to_string())
            } else {
                BlobError::Io(e.to_string())
            }
        })
    }
}
