use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Events older (or newer) than this are rejected to bound replay
/// exposure on the public endpoint.
const FRESHNESS_WINDOW_SECONDS: i64 = 30 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature header is missing")]
    Missing,

    #[error("Signature header is malformed")]
    Malformed,

    #[error("Signature timestamp is outside the freshness window")]
    StaleTimestamp,

    #[error("Signature does not match payload")]
    Mismatch,
}

/// Verify a `t={timestamp},v0={hex digest}` signature header against the
/// raw request body. The digest is an HMAC-SHA256 of `"{timestamp}.{body}"`
/// keyed with the shared secret; the comparison is constant time.
pub fn verify_signature(
    secret: &str,
    header: &str,
    raw_body: &[u8],
    now_ts: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut digest = None;

    for part in header.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("t=") {
            timestamp = value.parse::<i64>().ok();
        } else if let Some(value) = part.strip_prefix("v0=") {
            digest = Some(value);
        }
    }

    let (Some(timestamp), Some(digest)) = (timestamp, digest) else {
        return Err(SignatureError::Malformed);
    };

    if (now_ts - timestamp).abs() > FRESHNESS_WINDOW_SECONDS {
        return Err(SignatureError::StaleTimestamp);
    }

    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Produce the signature header for a payload. The counterpart of
/// [`verify_signature`], used by tests and operator tooling.
pub fn sign_payload(secret: &str, timestamp: i64, raw_body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    let digest = hex::encode(mac.finalize().into_bytes());
    format!("t={},v0={}", timestamp, digest)
}
