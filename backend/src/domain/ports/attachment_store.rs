//! Port for storing uploaded attachments.
use async_trait::async_trait;

use crate::domain::AttachmentName;

use super::define_port_error;

define_port_error! {
    /// Errors raised by attachment storage adapters.
    pub enum AttachmentStoreError {
        Io { message: String } => "attachment storage failed: {message}",
        NotFound { name: String } => "attachment {name} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn save(&self, name: &AttachmentName, bytes: &[u8]) -> Result<(), AttachmentStoreError>;

    async fn load(&self, name: &AttachmentName) -> Result<Vec<u8>, AttachmentStoreError>;
}
