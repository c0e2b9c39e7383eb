//! Small self-contained helpers used across the engine: identifiers, reset tickets, and the payment gateway
//! signature check.

mod passwords;
mod signature;
mod validation;

pub use passwords::{hash_password, verify_password};
pub use signature::{payment_signature_payload, verify_payment_signature};
pub use validation::{
    validate_address,
    validate_email,
    validate_password_strength,
    validate_person_name,
    validate_phone,
    validate_pincode,
    validate_staff_registration,
};

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in an account id.
const ACCOUNT_ID_BYTES: usize = 12;

/// Number of random bytes in a password-reset token.
const RESET_TOKEN_BYTES: usize = 32;

pub fn encode_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        encoded.push(HEX[(byte >> 4) as usize] as char);
        encoded.push(HEX[(byte & 0x0f) as usize] as char);
    }
    encoded
}

pub fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(value.len() / 2);
    for pair in bytes.chunks(2) {
        let hi = decode_hex_nibble(pair[0])?;
        let lo = decode_hex_nibble(pair[1])?;
        decoded.push((hi << 4) | lo);
    }
    Some(decoded)
}

fn decode_hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}

/// Generate a fresh principal id. Ids are random hex so the user and staff stores share one namespace.
pub fn new_account_id() -> String {
    let mut bytes = [0u8; ACCOUNT_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    encode_hex(&bytes)
}

/// Generate a password-reset token. Returns `(plain, hash)`: the plain token goes into the emailed link, only the
/// SHA-256 hash is stored.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let plain = encode_hex(&bytes);
    let hash = hash_reset_token(&plain);
    (plain, hash)
}

/// Hash a reset token the way it is stored: SHA-256 over the hex string, hex-encoded.
pub fn hash_reset_token(plain: &str) -> String {
    encode_hex(&Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let bytes = [0x00, 0x0f, 0xab, 0xff];
        let encoded = encode_hex(&bytes);
        assert_eq!(encoded, "000fabff");
        assert_eq!(decode_hex(&encoded).unwrap(), bytes);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(decode_hex("abc").is_none());
        assert!(decode_hex("zz").is_none());
    }

    #[test]
    fn account_ids_are_unique_and_well_formed() {
        let a = new_account_id();
        let b = new_account_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 24);
        assert!(decode_hex(&a).is_some());
    }

    #[test]
    fn reset_token_hash_matches_regeneration() {
        let (plain, hash) = generate_reset_token();
        assert_eq!(hash_reset_token(&plain), hash);
        assert_ne!(plain, hash);
    }
}
