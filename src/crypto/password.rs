use argon2::Argon2;
use rand::Rng;

use crate::error::AppError;

pub const SALT_LEN: usize = 32;
pub const HASH_LEN: usize = 32;

/// Salted Argon2id digest as stored on the user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: [u8; HASH_LEN],
    pub salt: [u8; SALT_LEN],
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::thread_rng().gen()
}

/// Hash a password with Argon2id using the provided salt
pub fn hash_password(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], AppError> {
    let mut hash = [0u8; HASH_LEN];

    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

    Ok(hash)
}

/// Hash a new password under a fresh salt.
pub fn digest_password(password: &str) -> Result<PasswordDigest, AppError> {
    let salt = generate_salt();
    let hash = hash_password(password, &salt)?;
    Ok(PasswordDigest { hash, salt })
}

/// Compare a candidate password with a stored hash and salt.
pub fn verify_password(password: &str, stored_hash: &[u8], salt: &[u8]) -> Result<bool, AppError> {
    if stored_hash.len() != HASH_LEN {
        return Err(AppError::Internal("Invalid stored hash".to_string()));
    }
    let computed = hash_password(password, salt)?;

    // constant time over the full digest
    let diff = computed
        .iter()
        .zip(stored_hash)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0)
}
