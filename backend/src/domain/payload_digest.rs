//! SHA-256 fingerprints of client payloads.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the payload's compact JSON form.
///
/// A missing payload hashes as `{}`. Object keys serialise in sorted order, so
/// equal documents always produce equal digests.
///
/// # Examples
/// ```
/// use portal::domain::digest_payload;
///
/// assert_eq!(
///     digest_payload(None),
///     "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
/// );
/// ```
pub fn digest_payload(payload: Option<&Value>) -> String {
    let empty = Value::Object(serde_json::Map::new());
    let payload = payload.filter(|value| !value.is_null()).unwrap_or(&empty);
    let serialised = payload.to_string();
    hex::encode(Sha256::digest(serialised.as_bytes()))
}
