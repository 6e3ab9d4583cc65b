// src/utils/hash.rs

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates a random 16-byte salt, hex-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    rand::rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Hex-encoded SHA-256 over the raw password concatenated with the hex salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recomputes the hash with the stored salt and compares.
/// Not a constant-time comparison; known hardening gap in the stored scheme.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    hash_password(password, salt) == stored_hash
}
