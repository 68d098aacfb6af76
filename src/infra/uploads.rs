//! Filesystem storage for uploaded assets.
//!
//! Files are first streamed into a staging directory under the upload root and
//! only renamed to their final destination once the surrounding submission has
//! been validated. Staged files that are never placed are removed on drop.

use std::error::Error as StdError;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use sha2::{Digest, Sha256};
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};

const STAGING_DIR: &str = ".staging";

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file exceeds configured body limit")]
    PayloadTooLarge {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded file stream failed")]
    PayloadStream {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file size exceeds supported range")]
    SizeOverflow,
}

/// A fully received upload waiting in the staging directory.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size_bytes: u64,
    checksum: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Lowercase hex SHA-256 of the staged bytes.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
    staging: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at `root`, creating it and its staging area if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        let staging = root.join(STAGING_DIR);
        std::fs::create_dir_all(&staging)?;
        Ok(Self { root, staging })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    /// Stream a payload into a fresh staging file.
    pub async fn stage_stream<S>(&self, stream: S) -> Result<StagedFile, UploadStorageError>
    where
        S: Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let (file, path) = NamedTempFile::new_in(&self.staging)?.into_parts();
        let mut file = fs::File::from_std(file);
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            total_bytes = total_bytes
                .checked_add(chunk.len() as u64)
                .ok_or(UploadStorageError::SizeOverflow)?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
        }

        file.flush().await?;
        drop(file);

        if total_bytes == 0 {
            return Err(UploadStorageError::EmptyPayload);
        }

        Ok(StagedFile {
            path,
            size_bytes: total_bytes,
            checksum: hex::encode(hasher.finalize()),
        })
    }

    /// Stage a fully-buffered payload.
    pub async fn stage(&self, data: Bytes) -> Result<StagedFile, UploadStorageError> {
        let stream = futures::stream::once(async move { Ok::<_, UploadStorageError>(data) });
        self.stage_stream(stream).await
    }

    /// Move a staged file to `destination`, replacing whatever was there.
    pub async fn place(
        &self,
        staged: StagedFile,
        destination: &str,
    ) -> Result<PathBuf, UploadStorageError> {
        let absolute = self.resolve(destination)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        staged
            .path
            .persist(&absolute)
            .map_err(|err| UploadStorageError::Io(err.error))?;
        Ok(absolute)
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    pub fn absolute_path(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        self.resolve(stored_path)
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir
            )
        });
        let staged = relative
            .components()
            .next()
            .is_some_and(|first| first.as_os_str() == STAGING_DIR);
        if stored_path.is_empty() || relative.is_absolute() || escapes || staged {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}
