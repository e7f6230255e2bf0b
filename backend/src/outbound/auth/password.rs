//! Salted SHA-256 password hashing adapter.
//!
//! Stored form is `sha256$<hex salt>$<hex digest>` where the digest covers
//! salt followed by the password bytes. The scheme tag keeps room for a
//! stronger KDF behind the same port later.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::ports::PasswordHasher;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Password hasher shipping with the in-memory adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PasswordHasher;

impl Sha256PasswordHasher {
    /// Create the hasher.
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &[u8], password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = Self::digest(&salt, password);
        format!("{SCHEME}${}${digest}", hex::encode(salt))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let mut parts = hash.split('$');
        let (Some(scheme), Some(salt_hex), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        // Digests are fixed-length hex, so a plain comparison does not leak
        // length information.
        Self::digest(&salt, password) == digest
    }
}
