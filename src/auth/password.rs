use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
};
use argon2::{ARGON2ID_IDENT, Algorithm, Argon2, Params, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Parameters(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Argon2id password hashing with configurable cost.
///
/// Hashes are stored in PHC string format, so the parameters used for a
/// given hash can be read back and compared with the current ones.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::Parameters(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        Ok(self.argon2().verify_password(plain.as_bytes(), &parsed).is_ok())
    }

    /// Whether `hash` was produced with another algorithm or weaker cost
    /// settings than the current ones.
    pub fn needs_rehash(&self, hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        if parsed.algorithm != ARGON2ID_IDENT {
            return Ok(true);
        }
        let stored =
            Params::try_from(&parsed).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        Ok(stored.m_cost() != self.params.m_cost()
            || stored.t_cost() != self.params.t_cost()
            || stored.p_cost() != self.params.p_cost())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = cheap();
        assert_ne!(hasher.hash("secret").unwrap(), hasher.hash("secret").unwrap());
    }

    #[test]
    fn same_parameters_do_not_need_rehash() {
        let hasher = cheap();
        let hash = hasher.hash("secret").unwrap();
        assert!(!hasher.needs_rehash(&hash).unwrap());
    }

    #[test]
    fn stronger_parameters_require_rehash() {
        let hash = cheap().hash("secret").unwrap();
        let stronger = PasswordHasher::new(2048, 2, 1).unwrap();

        assert!(stronger.needs_rehash(&hash).unwrap());
        assert!(stronger.verify("secret", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_reported() {
        assert!(matches!(
            cheap().verify("secret", "plain-text"),
            Err(PasswordError::MalformedHash(_))
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            PasswordHasher::new(1, 0, 0),
            Err(PasswordError::Parameters(_))
        ));
    }
}
