//! Webhook signature verification.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a LINE webhook signature using constant-time comparison.
///
/// The platform sends `X-Line-Signature: <base64>`, the base64-encoded
/// HMAC-SHA256 of the raw request body keyed with the channel secret.
#[must_use]
pub fn verify(channel_secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::unwrap_used, reason = "HMAC accepts any key length")]
    fn compute_sig(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let sig = compute_sig("test-secret", b"{\"events\":[]}");
        assert!(verify("test-secret", b"{\"events\":[]}", &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = compute_sig("correct-secret", b"body");
        assert!(!verify("wrong-secret", b"body", &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let sig = compute_sig("secret", b"original body");
        assert!(!verify("secret", b"tampered body", &sig));
    }

    #[test]
    fn invalid_base64_fails() {
        assert!(!verify("secret", b"body", "not base64 at all!!!"));
    }

    #[test]
    fn empty_body_with_valid_sig_passes() {
        let sig = compute_sig("secret", b"");
        assert!(verify("secret", b"", &sig));
    }
}
