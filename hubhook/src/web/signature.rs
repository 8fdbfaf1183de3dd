//! Webhook signature verification.
//!
//! The sender signs each delivery with HMAC-SHA1 over the raw request body,
//! keyed by the shared secret, and sends it as `X-Hub-Signature: sha1=<hex>`.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::{debug, warn};

type HmacSha1 = Hmac<Sha1>;

/// Prefix identifying the digest algorithm in the signature header.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// Verify a webhook signature.
///
/// # Arguments
///
/// * `body` - The raw, unmodified request body
/// * `signature` - The signature header value, e.g. `sha1=5d61605c...`
/// * `secret` - The shared secret configured for this receiver
///
/// # Returns
///
/// `true` if the header carries the HMAC-SHA1 of `body` under `secret`.
/// Any malformed input yields `false`.
pub fn is_valid_signature(body: &[u8], signature: &str, secret: &[u8]) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        debug!(
            has_signature = !signature.is_empty(),
            "webhook_signature_missing_prefix"
        );
        return false;
    };

    let expected = match hex::decode(hex_digest) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "webhook_signature_invalid_hex");
            return false;
        }
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };

    mac.update(body);

    // verify_slice compares in constant time
    let valid = mac.verify_slice(&expected).is_ok();

    if !valid {
        warn!(
            body_length = body.len(),
            digest_length = expected.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Compute the signature header value for `body` under `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Check if signature verification is enabled for the given secret.
pub fn is_signature_verification_enabled(secret: &[u8]) -> bool {
    !secret.is_empty()
}
