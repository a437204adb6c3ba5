//! Uploaded attachment naming and limits.

use std::fmt;

use serde_json::json;

use super::Error;

/// Largest accepted upload, in bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix under which stored attachments are served.
pub const ATTACHMENT_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    #[error("No file")]
    Missing,
    #[error("file exceeds the {max} byte limit")]
    TooLarge { max: usize },
    #[error("attachment name is not valid")]
    InvalidName,
}

/// Name an attachment is stored under.
///
/// Only `[A-Za-z0-9._-]` characters, never starting with a dot, so a name can
/// be joined to the upload directory without escaping it.
///
/// # Examples
/// ```
/// use portal::domain::AttachmentName;
///
/// let name = AttachmentName::for_upload("../../etc/my notes.pdf", 1_700_000_000_000);
/// assert_eq!(name.as_ref(), "1700000000000-my_notes.pdf");
/// assert_eq!(name.url(), "/uploads/1700000000000-my_notes.pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentName(String);

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

impl AttachmentName {
    /// Derive the stored name from a client file name and upload time.
    pub fn for_upload(original: &str, unix_millis: i64) -> Self {
        let last = original
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let cleaned: String = last
            .chars()
            .map(|c| if is_safe(c) { c } else { '_' })
            .collect();
        let cleaned = cleaned.trim_start_matches('.');
        let cleaned = if cleaned.is_empty() { "file" } else { cleaned };
        Self(format!("{unix_millis}-{cleaned}"))
    }

    /// Validate a stored name supplied in a download path.
    pub fn parse(raw: &str) -> Result<Self, AttachmentError> {
        if raw.is_empty() || raw.starts_with('.') || !raw.chars().all(is_safe) {
            return Err(AttachmentError::InvalidName);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Public URL for the attachment.
    pub fn url(&self) -> String {
        format!("{ATTACHMENT_URL_PREFIX}/{}", self.0)
    }
}

impl AsRef<str> for AttachmentName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AttachmentError> for Error {
    fn from(error: AttachmentError) -> Self {
        let code = match error {
            AttachmentError::Missing => "missing",
            AttachmentError::TooLarge { .. } => "too_large",
            AttachmentError::InvalidName => "invalid_name",
        };
        Self::invalid_request(error.to_string()).with_details(json!({ "field": "file", "code": code }))
    }
}
