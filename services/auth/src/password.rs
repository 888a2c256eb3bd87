//! Password hashing with Argon2id
//!
//! Hashing is CPU bound, so the async entry points move the work onto the
//! blocking thread pool.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordConfig {
    /// Minimal cost, for tests and throwaway demo data only
    pub fn low_cost() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Hashes and verifies account passwords
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    /// Create a password service with the given cost parameters
    pub fn new(config: PasswordConfig) -> AuthResult<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Configuration(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string
    pub fn hash_password_sync(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(format!("Failed to hash password: {}", e)))
    }

    /// Check a password against a stored PHC string
    pub fn verify_password_sync(&self, password_hash: &str, password: &str) -> AuthResult<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::Hashing(format!("Failed to parse password hash: {}", e)))?;

        let matches = self
            .argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        debug!(matches, "Password verification finished");

        Ok(matches)
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, password: &str) -> AuthResult<String> {
        let service = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || service.hash_password_sync(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("Hashing task failed: {}", e)))?
    }

    /// Verify a password on the blocking pool
    pub async fn verify_password(&self, password_hash: &str, password: &str) -> AuthResult<bool> {
        let service = self.clone();
        let password_hash = password_hash.to_owned();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || service.verify_password_sync(&password_hash, &password))
            .await
            .map_err(|e| AuthError::Hashing(format!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(PasswordConfig::low_cost()).unwrap()
    }

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let service = service();
        let first = service.hash_password_sync("pw123").unwrap();
        let second = service.hash_password_sync("pw123").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(service.verify_password_sync(&first, "pw123").unwrap());
        assert!(!service.verify_password_sync(&first, "pw124").unwrap());
    }

    #[test]
    fn test_unparseable_hash_is_an_error() {
        assert!(service().verify_password_sync("plaintext", "plaintext").is_err());
    }

    #[tokio::test]
    async fn test_async_wrappers_agree_with_sync() {
        let service = service();
        let hash = service.hash_password("organizer123").await.unwrap();
        assert!(service.verify_password(&hash, "organizer123").await.unwrap());
        assert!(!service.verify_password(&hash, "admin123").await.unwrap());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let config = PasswordConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(PasswordService::new(config).is_err());
    }
}
