//! Attachment uploads backing feedback submissions.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::ports::{AttachmentCommand, AttachmentStore};
use super::service_errors::map_attachment_error;
use super::{AttachmentError, AttachmentName, Error, MAX_ATTACHMENT_BYTES};

/// Attachment service implementing [`AttachmentCommand`].
#[derive(Clone)]
pub struct AttachmentService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> AttachmentService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl<S> AttachmentCommand for AttachmentService<S>
where
    S: AttachmentStore,
{
    async fn upload(&self, original_name: &str, bytes: Vec<u8>) -> Result<AttachmentName, Error> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                max: MAX_ATTACHMENT_BYTES,
            }
            .into());
        }
        let name = AttachmentName::for_upload(original_name, self.clock.utc().timestamp_millis());
        self.store
            .save(&name, &bytes)
            .await
            .map_err(map_attachment_error)?;
        info!(attachment = %name, bytes = bytes.len(), "attachment stored");
        Ok(name)
    }

    async fn fetch(&self, name: &AttachmentName) -> Result<Vec<u8>, Error> {
        self.store.load(name).await.map_err(map_attachment_error)
    }
}
