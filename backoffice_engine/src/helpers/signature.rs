//! Payment gateway callback signature verification.
//!
//! The gateway signs `"{gateway_order_id}|{gateway_payment_id}"` with HMAC-SHA256 under the shared API secret and
//! sends the hex-encoded MAC alongside the capture callback. Verification is a pure function; attaching a verified
//! payment to an order is the caller's job.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::decode_hex;

type HmacSha256 = Hmac<Sha256>;

pub fn payment_signature_payload(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{gateway_order_id}|{gateway_payment_id}")
}

/// Check the supplied hex signature against the recomputed MAC. The comparison runs in constant time
/// ([`Mac::verify_slice`]); a malformed hex signature simply fails.
pub fn verify_payment_signature(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    supplied_signature: &str,
    secret: &str,
) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payment_signature_payload(gateway_order_id, gateway_payment_id).as_bytes());
    match decode_hex(supplied_signature) {
        Some(signature) => mac.verify_slice(&signature).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use super::*;
    use crate::helpers::encode_hex;

    fn sign(payload: &str, secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        encode_hex(&mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_the_gateway_signature() {
        let expected = sign("order_1|pay_1", "s3cret");
        assert!(verify_payment_signature("order_1", "pay_1", &expected, "s3cret"));
    }

    #[test]
    fn rejects_a_forged_signature() {
        assert!(!verify_payment_signature("order_1", "pay_1", "deadbeef", "s3cret"));
    }

    #[test]
    fn rejects_a_signature_for_different_ids() {
        let expected = sign("order_1|pay_1", "s3cret");
        assert!(!verify_payment_signature("order_2", "pay_1", &expected, "s3cret"));
        assert!(!verify_payment_signature("order_1", "pay_2", &expected, "s3cret"));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let expected = sign("order_1|pay_1", "s3cret");
        assert!(!verify_payment_signature("order_1", "pay_1", &expected, "not-the-secret"));
    }

    #[test]
    fn rejects_non_hex_garbage() {
        assert!(!verify_payment_signature("order_1", "pay_1", "not hex at all", "s3cret"));
    }
}
