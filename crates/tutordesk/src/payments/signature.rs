//! Payment signature verification.
//!
//! The gateway signs `{order_id}|{payment_id}` with HMAC-SHA256 under the
//! account's secret key and sends the hex digest back with the checkout
//! callback. Verification recomputes the MAC and compares through the Mac
//! primitive, which performs a constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> HmacSha256 {
    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Computes the hex digest the gateway is expected to send.
pub fn expected_signature(order_id: &str, payment_id: &str, secret: &str) -> String {
    let digest = mac_for(order_id, payment_id, secret).finalize();
    hex::encode(digest.into_bytes().as_slice())
}

/// Verifies a gateway signature. A digest that is not valid hex fails
/// without further work.
pub fn verify(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let Some(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    mac_for(order_id, payment_id, secret)
        .verify_slice(&sig_bytes)
        .is_ok()
}

/// Hex helpers (avoiding an extra dependency).
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_key_secret";

    #[test]
    fn test_signature_is_deterministic() {
        let a = expected_signature("order_1", "pay_1", SECRET);
        let b = expected_signature("order_1", "pay_1", SECRET);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hex digest
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_any_input_change_changes_digest() {
        let base = expected_signature("order_1", "pay_1", SECRET);
        assert_ne!(base, expected_signature("order_2", "pay_1", SECRET));
        assert_ne!(base, expected_signature("order_1", "pay_2", SECRET));
        assert_ne!(base, expected_signature("order_1", "pay_1", "other_secret"));
    }

    #[test]
    fn test_verify_accepts_matching_signature() {
        let sig = expected_signature("order_1", "pay_1", SECRET);
        assert!(verify("order_1", "pay_1", &sig, SECRET));
    }

    #[test]
    fn test_verify_rejects_mutated_signature() {
        let sig = expected_signature("order_1", "pay_1", SECRET);
        let mut chars: Vec<char> = sig.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        let mutated: String = chars.into_iter().collect();
        assert!(!verify("order_1", "pay_1", &mutated, SECRET));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify("order_1", "pay_1", "", SECRET));
        assert!(!verify("order_1", "pay_1", "not-hex!", SECRET));
        assert!(!verify("order_1", "pay_1", "abc", SECRET)); // odd length
    }

    #[test]
    fn test_hex_roundtrip() {
        let bytes = vec![0x00, 0x7f, 0xff, 0x10];
        let encoded = hex::encode(&bytes);
        assert_eq!(encoded, "007fff10");
        assert_eq!(hex::decode(&encoded), Some(bytes));
        assert_eq!(hex::decode("zz"), None);
    }
}
