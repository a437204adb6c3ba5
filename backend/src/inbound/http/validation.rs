//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{EmailAddress, EmailPolicy, Error, FeedbackId, UserId, UserValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidEmail,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidEmail => "invalid_email",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(field, format!("missing required field: {name}"), ErrorCode::MissingField)
}

/// Trimmed, non-blank value of a required text field.
pub(crate) fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_email(
    raw: &str,
    policy: &EmailPolicy,
    field: FieldName,
) -> Result<EmailAddress, Error> {
    EmailAddress::parse(raw, policy).map_err(|err| match err {
        UserValidationError::EmptyEmail => missing_field_error(field),
        other => field_error(field, other.to_string(), ErrorCode::InvalidEmail),
    })
}

pub(crate) fn parse_feedback_id(raw: &str, field: FieldName) -> Result<FeedbackId, Error> {
    let name = field.as_str();
    FeedbackId::parse(raw.trim())
        .map_err(|_| field_error(field, format!("{name} must be a valid UUID"), ErrorCode::InvalidUuid))
}

pub(crate) fn parse_user_id(raw: &str, field: FieldName) -> Result<UserId, Error> {
    let name = field.as_str();
    UserId::new(raw.trim())
        .map_err(|_| field_error(field, format!("{name} must be a valid UUID"), ErrorCode::InvalidUuid))
}
