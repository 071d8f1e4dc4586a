//! Cryptographic utilities for payment confirmation verification.
//!
//! The gateway signs each confirmation as HMAC-SHA256 over
//! `"{order_id}|{payment_id}"` with the shared gateway secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded
/// by the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Verify a payment confirmation signature.
///
/// Returns `true` when `signature` is the HMAC of `"{order_id}|{payment_id}"`
/// under `secret`, compared in constant time.
#[must_use]
pub fn verify_confirmation_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let expected = hmac_sha256_hex(secret, &format!("{order_id}|{payment_id}"));
    constant_time_eq(&expected, signature)
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_produces_64_hex_chars() {
        let result = hmac_sha256_hex("key", "order_1|pay_1");
        assert_eq!(result.len(), 64);
    }

    #[test]
    fn hmac_sha256_is_deterministic() {
        assert_eq!(
            hmac_sha256_hex("secret", "message"),
            hmac_sha256_hex("secret", "message")
        );
    }

    #[test]
    fn valid_signature_verifies() {
        let sig = hmac_sha256_hex("secret", "ord_1|pay_1");
        assert!(verify_confirmation_signature("secret", "ord_1", "pay_1", &sig));
    }

    #[test]
    fn tampered_fields_fail_verification() {
        let sig = hmac_sha256_hex("secret", "ord_1|pay_1");
        assert!(!verify_confirmation_signature("secret", "ord_2", "pay_1", &sig));
        assert!(!verify_confirmation_signature("secret", "ord_1", "pay_2", &sig));
        assert!(!verify_confirmation_signature("other", "ord_1", "pay_1", &sig));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }
}
