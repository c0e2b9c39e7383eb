//! Argon2 password hashing in PHC string format.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::api::errors::AuthApiError;

pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthApiError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// `true` iff `password` is the password that produced `stored`. An unparseable stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_is_never_the_plaintext_and_verifies() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert_ne!(hash, "Sup3r$ecret");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Sup3r$ecret", &hash));
        assert!(!verify_password("Sup3r$ecreT", &hash));
    }

    #[test]
    fn garbage_stored_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
