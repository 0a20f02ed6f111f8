use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AppError, Result};

/// Stored for accounts that cannot log in with a password. Never parses as a PHC string.
pub const UNUSABLE_PASSWORD: &str = "!";

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
        .to_string())
}

/// False for a wrong password and for hashes that are not valid PHC strings.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Salt of the stored hash. Every new hash gets a fresh salt, so sessions
/// carrying the old value stop matching once the password changes.
pub fn password_fingerprint(hash: &str) -> String {
    PasswordHash::new(hash)
        .ok()
        .and_then(|parsed| parsed.salt.map(|salt| salt.as_str().to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_changes_with_each_hash() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert!(!password_fingerprint(&first).is_empty());
        assert_ne!(password_fingerprint(&first), password_fingerprint(&second));
        assert_eq!(password_fingerprint(UNUSABLE_PASSWORD), "");
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn unusable_password_never_verifies() {
        assert!(!verify_password("", UNUSABLE_PASSWORD));
        assert!(!verify_password("!", UNUSABLE_PASSWORD));
    }
}
