//! Filesystem attachment store rooted at the upload directory.
//!
//! All access goes through a `cap_std` directory handle, so stored names can
//! never reach outside the upload root.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::AttachmentName;
use crate::domain::ports::{AttachmentStore, AttachmentStoreError};

/// `AttachmentStore` backed by a capability-scoped directory.
#[derive(Debug, Clone)]
pub struct DirAttachmentStore {
    root: Arc<Dir>,
}

impl DirAttachmentStore {
    /// Create the upload directory if needed and open it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(path: &Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            root: Arc::new(root),
        })
    }
}

fn map_io_error(name: &AttachmentName, error: &io::Error) -> AttachmentStoreError {
    if error.kind() == io::ErrorKind::NotFound {
        AttachmentStoreError::not_found(name.as_ref())
    } else {
        AttachmentStoreError::io(format!("{}: {error}", name.as_ref()))
    }
}

#[async_trait]
impl AttachmentStore for DirAttachmentStore {
    async fn save(&self, name: &AttachmentName, bytes: &[u8]) -> Result<(), AttachmentStoreError> {
        let root = Arc::clone(&self.root);
        let file = name.clone();
        let contents = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            root.write(file.as_ref(), contents)
                .map_err(|err| map_io_error(&file, &err))
        })
        .await
        .map_err(|err| AttachmentStoreError::io(err.to_string()))??;
        debug!(name = name.as_ref(), size = bytes.len(), "attachment stored");
        Ok(())
    }

    async fn load(&self, name: &AttachmentName) -> Result<Vec<u8>, AttachmentStoreError> {
        let root = Arc::clone(&self.root);
        let file = name.clone();
        tokio::task::spawn_blocking(move || {
            root.read(file.as_ref())
                .map_err(|err| map_io_error(&file, &err))
        })
        .await
        .map_err(|err| AttachmentStoreError::io(err.to_string()))?
    }
}
