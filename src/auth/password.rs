//! One-way password hashing. The work factor matches the original deployment
//! and is the only deliberately expensive computation in the service.

use crate::error::AppError;

const BCRYPT_COST: u32 = 10;

pub fn hash(plaintext: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plaintext, BCRYPT_COST)?)
}

pub fn verify(plaintext: &str, hashed: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(plaintext, hashed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hashed = hash("secret1").unwrap();
        assert_ne!(hashed, "secret1");
        assert!(hashed.starts_with("$2"));
        assert!(verify("secret1", &hashed).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hashed = hash("secret1").unwrap();
        assert!(!verify("secret2", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash("secret1").unwrap();
        let b = hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_opaque_error() {
        let err = verify("secret1", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::Hashing)));
    }
}
