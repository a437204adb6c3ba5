//! Driving port for attachment uploads and downloads.

use async_trait::async_trait;

use crate::domain::{AttachmentName, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentCommand: Send + Sync {
    /// Store an upload under a sanitised, timestamped name.
    async fn upload(&self, original_name: &str, bytes: Vec<u8>) -> Result<AttachmentName, Error>;

    /// Read a stored attachment back.
    async fn fetch(&self, name: &AttachmentName) -> Result<Vec<u8>, Error>;
}
