use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// Argon2id hashing with parameters embedded in the PHC output string.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Hash of a random password at this service's cost, verified against
    /// when no stored hash exists so the miss costs the same as a mismatch.
    dummy_hash: String,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        Self::with_cost(19 * 1024, 2, 1) // 19 MiB
    }

    /// Build a service with explicit memory (KiB), iteration and lane costs.
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(memory_kib);
        builder.t_cost(iterations);
        builder.p_cost(parallelism);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut service = Self {
            argon2,
            dummy_hash: String::new(),
        };
        let mut secret = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        service.dummy_hash = service.hash_password(&URL_SAFE_NO_PAD.encode(secret))?;
        Ok(service)
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// Verify against a stored hash. The cost parameters come from the hash
    /// itself, so hashes produced under older settings keep verifying.
    pub fn verify_password(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(encoded)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::from(err)),
        }
    }

    /// Spend one verification on a password that has no stored hash.
    /// Always `false`.
    pub fn verify_missing(&self, password: &str) -> AuthResult<bool> {
        self.verify_password(password, &self.dummy_hash)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_service() -> PasswordService {
        PasswordService::with_cost(1024, 1, 1).expect("password service")
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let service = PasswordService::new().expect("password service");
        let hash = service
            .hash_password("super-secret")
            .expect("hash generation");
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
        assert!(
            service
                .verify_password("super-secret", &hash)
                .expect("verify succeeds")
        );
        assert!(
            !service
                .verify_password("wrong-password", &hash)
                .expect("verify runs")
        );
    }

    #[test]
    fn salts_every_hash() {
        let service = cheap_service();
        let first = service.hash_password("password").expect("hash");
        let second = service.hash_password("password").expect("hash");
        assert_ne!(first, second);
        assert!(service.verify_password("password", &first).expect("verify"));
        assert!(service.verify_password("password", &second).expect("verify"));
    }

    #[test]
    fn verifies_with_parameters_from_the_hash() {
        let strong = PasswordService::new().expect("password service");
        let hash = strong.hash_password("04234").expect("hash");
        assert!(cheap_service().verify_password("04234", &hash).expect("verify"));
    }

    #[test]
    fn empty_password_is_hashed_like_any_other() {
        let service = cheap_service();
        let hash = service.hash_password("").expect("hash");
        assert!(service.verify_password("", &hash).expect("verify"));
        assert!(!service.verify_password(" ", &hash).expect("verify"));
    }

    #[test]
    fn missing_hash_still_runs_a_verification() {
        let service = cheap_service();
        assert!(service.dummy_hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!service.verify_missing("04234").expect("verify runs"));
        assert!(!service.verify_missing("").expect("verify runs"));
    }

    #[test]
    fn rejects_malformed_hash_strings() {
        let err = cheap_service()
            .verify_password("password", "not-a-phc-string")
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordHash(_)));
    }
}
