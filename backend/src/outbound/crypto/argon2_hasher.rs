//! Argon2id implementation of the `PasswordHasher` port.

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher as _, SaltString};
use async_trait::async_trait;
use rand::RngCore;

use crate::domain::ports::{PasswordHashError, PasswordHasher};
use crate::domain::{Password, PasswordHash};

/// Hashes passwords with Argon2id default parameters and a random 16-byte
/// salt, producing a PHC string.
///
/// Hashing is CPU-bound, so it runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Hasher with the library's default cost parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn hash_blocking(plaintext: &str) -> Result<PasswordHash, PasswordHashError> {
    let mut salt_bytes = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| PasswordHashError::hashing(err.to_string()))?;

    let encoded = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| PasswordHashError::hashing(err.to_string()))?
        .to_string();
    PasswordHash::new(encoded).map_err(|err| PasswordHashError::hashing(err.to_string()))
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        let plaintext = password.expose().to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(&plaintext))
            .await
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash as Phc, PasswordVerifier};
    use rstest::rstest;

    fn verifies(plaintext: &str, hash: &PasswordHash) -> bool {
        let parsed = Phc::new(hash.as_ref()).expect("PHC string");
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    #[rstest]
    #[tokio::test]
    async fn produces_verifiable_argon2id_hashes() {
        let password = Password::new("correct horse").expect("password");

        let hash = Argon2PasswordHasher::new()
            .hash(&password)
            .await
            .expect("hash");

        assert!(hash.as_ref().starts_with("$argon2id$"));
        assert!(verifies("correct horse", &hash));
        assert!(!verifies("wrong horse", &hash));
    }

    #[rstest]
    #[tokio::test]
    async fn salts_differ_between_calls() {
        let hasher = Argon2PasswordHasher::new();
        let password = Password::new("p").expect("password");

        let first = hasher.hash(&password).await.expect("first");
        let second = hasher.hash(&password).await.expect("second");

        assert_ne!(first.as_ref(), second.as_ref());
    }
}
