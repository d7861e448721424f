// Password hashing and verification using bcrypt.

use thiserror::Error;

/// Work factor for bcrypt. Raising it invalidates no stored hashes but slows
/// login verification accordingly.
const BCRYPT_COST: u32 = 10;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| PasswordError::HashingError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::VerificationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("StrongPass1").unwrap();
        assert_ne!(hash, "StrongPass1");
        assert!(verify_password("StrongPass1", &hash).unwrap());
        assert!(!verify_password("WrongPass1", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("StrongPass1").unwrap();
        let second = hash_password("StrongPass1").unwrap();
        assert_ne!(first, second);
    }
}
